//! Record-level diff: split two record sets into added / removed / changed.

use std::collections::HashMap;

use stave_types::{ChangeKind, Delta, Node};

use crate::payload::delta_for;
use crate::record::{sort_records, Record};

/// The buckets produced by comparing two record sets of one kind.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDiff<R> {
    /// Records only present in the new set.
    pub added: Vec<R>,
    /// Records only present in the old set.
    pub removed: Vec<R>,
    /// New versions of records whose content differs.
    pub changed: Vec<R>,
}

impl<R: Record> RecordDiff<R> {
    /// Returns `true` if all buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of records across buckets.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// One delta-diff per non-empty bucket, in added, removed, changed order.
    pub fn into_deltas(self) -> Vec<(Delta, Node)> {
        [
            (ChangeKind::Added, self.added),
            (ChangeKind::Removed, self.removed),
            (ChangeKind::Changed, self.changed),
        ]
        .into_iter()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(change, bucket)| delta_for(change, &bucket))
        .collect()
    }
}

/// Compare `state` (old) against `changes` (new), matching records by id.
///
/// - state records whose id is missing from `changes` are removed
/// - records present in both with different content are changed (the
///   `changes` version is reported)
/// - `changes` records whose id is missing from `state` are added
///
/// Each bucket is sorted by beat, then id.
pub fn diff_records<R: Record>(state: &[R], changes: &[R]) -> RecordDiff<R> {
    let new_by_id: HashMap<&str, &R> = changes.iter().map(|r| (r.id(), r)).collect();
    let old_by_id: HashMap<&str, &R> = state.iter().map(|r| (r.id(), r)).collect();

    let mut removed = Vec::new();
    let mut changed = Vec::new();
    for old in state {
        match new_by_id.get(old.id()) {
            None => removed.push(old.clone()),
            Some(new) if !old.same_content(new) => changed.push((*new).clone()),
            Some(_) => {}
        }
    }

    let mut added: Vec<R> = changes
        .iter()
        .filter(|r| !old_by_id.contains_key(r.id()))
        .cloned()
        .collect();

    sort_records(&mut added);
    sort_records(&mut removed);
    sort_records(&mut changed);

    RecordDiff {
        added,
        removed,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Annotation, TimeSignature};

    fn ids<R: Record>(records: &[R]) -> Vec<&str> {
        records.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn identical_sets_no_diff() {
        let state = vec![Annotation::new("a1", 0.0, "Verse")];
        let diff = diff_records(&state, &state);
        assert!(diff.is_empty());
        assert!(diff.into_deltas().is_empty());
    }

    #[test]
    fn verse_to_chorus_scenario() {
        let ancestor = vec![Annotation::new("a1", 0.0, "Verse")];
        let branch = vec![
            Annotation::new("a1", 0.0, "Chorus"),
            Annotation::new("a2", 4.0, "Bridge"),
        ];
        let diff = diff_records(&ancestor, &branch);
        assert_eq!(diff.changed, vec![Annotation::new("a1", 0.0, "Chorus")]);
        assert_eq!(diff.added, vec![Annotation::new("a2", 4.0, "Bridge")]);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.len(), 2);
    }

    #[test]
    fn removal_reports_old_record() {
        let state = vec![
            TimeSignature::new("t1", 0.0, 4, 4),
            TimeSignature::new("t2", 16.0, 3, 4),
        ];
        let changes = vec![TimeSignature::new("t1", 0.0, 4, 4)];
        let diff = diff_records(&state, &changes);
        assert_eq!(diff.removed, vec![TimeSignature::new("t2", 16.0, 3, 4)]);
        assert!(diff.added.is_empty());
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn buckets_are_sorted_by_beat_then_id() {
        let changes = vec![
            Annotation::new("c", 8.0, "C"),
            Annotation::new("b", 2.0, "B"),
            Annotation::new("a", 8.0, "A"),
        ];
        let diff = diff_records(&[], &changes);
        assert_eq!(ids(&diff.added), ["b", "a", "c"]);
    }

    #[test]
    fn moving_a_record_is_a_change() {
        let state = vec![Annotation::new("a1", 0.0, "Verse")];
        let changes = vec![Annotation::new("a1", 12.0, "Verse")];
        let diff = diff_records(&state, &changes);
        assert_eq!(ids(&diff.changed), ["a1"]);
    }

    #[test]
    fn deltas_carry_counts_and_types() {
        let state = vec![
            Annotation::new("a1", 0.0, "Verse"),
            Annotation::new("a3", 2.0, "Gone"),
        ];
        let changes = vec![
            Annotation::new("a1", 0.0, "Chorus"),
            Annotation::new("a2", 4.0, "Bridge"),
            Annotation::new("a4", 6.0, "Outro"),
        ];
        let deltas = diff_records(&state, &changes).into_deltas();
        let summary: Vec<(String, i64)> = deltas
            .iter()
            .map(|(d, _)| (d.delta_type.to_string(), d.count))
            .collect();
        assert_eq!(
            summary,
            [
                ("annotations:added".to_string(), 2),
                ("annotations:removed".to_string(), 1),
                ("annotations:changed".to_string(), 1),
            ]
        );
        assert_eq!(deltas[0].1.len(), 2);
    }
}
