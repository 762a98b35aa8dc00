//! The merge triplet: fold one bucket of a branch onto an ancestor.
//!
//! The three operations are asymmetric. Each one handles a
//! single change kind, so reconciling a branch means applying the matching
//! operation for each of its added, removed and changed buckets. Results are
//! sorted by beat, then id, and never contain two records with the same id.

use std::collections::{HashMap, HashSet};

use crate::record::{sort_records, Record};

/// Union by id: every ancestor record, plus branch records with a new id.
pub fn merge_added<R: Record>(ancestor: &[R], branch: &[R]) -> Vec<R> {
    let mut merged = unique(ancestor);
    let mut present: HashSet<String> = merged.iter().map(|r| r.id().to_string()).collect();
    for record in branch {
        if present.insert(record.id().to_string()) {
            merged.push(record.clone());
        }
    }
    sort_records(&mut merged);
    merged
}

/// Survivors: ancestor records whose id does not appear in `branch`.
pub fn merge_removed<R: Record>(ancestor: &[R], branch: &[R]) -> Vec<R> {
    let dropped: HashSet<&str> = branch.iter().map(|r| r.id()).collect();
    let mut merged: Vec<R> = unique(ancestor)
        .into_iter()
        .filter(|r| !dropped.contains(r.id()))
        .collect();
    sort_records(&mut merged);
    merged
}

/// Override: ancestor records replaced by the branch version sharing their
/// id. Branch records with unknown ids are ignored.
pub fn merge_changed<R: Record>(ancestor: &[R], branch: &[R]) -> Vec<R> {
    let mut overrides: HashMap<&str, &R> = HashMap::new();
    for record in branch {
        overrides.entry(record.id()).or_insert(record);
    }
    let mut merged: Vec<R> = unique(ancestor)
        .into_iter()
        .map(|r| match overrides.get(r.id()) {
            Some(newer) => (*newer).clone(),
            None => r,
        })
        .collect();
    sort_records(&mut merged);
    merged
}

/// Copy of `records` keeping only the first record per id.
fn unique<R: Record>(records: &[R]) -> Vec<R> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.id().to_string()))
        .cloned()
        .collect()
}
