//! Deltas paired with their payloads.

use serde::{Deserialize, Serialize};
use stave_types::{ChangeKind, Delta, EntityKind, Node};

/// One delta and the payload it points at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub delta: Delta,
    pub payload: Node,
}

impl DeltaEntry {
    pub fn new(delta: Delta, payload: Node) -> Self {
        Self { delta, payload }
    }

    pub fn kind(&self) -> &EntityKind {
        self.delta.kind()
    }

    pub fn change(&self) -> ChangeKind {
        self.delta.change()
    }
}

impl From<(Delta, Node)> for DeltaEntry {
    fn from((delta, payload): (Delta, Node)) -> Self {
        Self::new(delta, payload)
    }
}

/// An ordered list of delta entries.
///
/// Produced by [`DiffLogic::create_diff`](crate::DiffLogic::create_diff)
/// (added / removed / changed entries) and by three-way merges (one merged
/// entry per kind).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub entries: Vec<DeltaEntry>,
}

impl Diff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, entry: DeltaEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeltaEntry> {
        self.entries.iter()
    }

    /// Entries of one entity kind, in order.
    pub fn entries_of<'a>(&'a self, kind: &'a EntityKind) -> impl Iterator<Item = &'a DeltaEntry> + 'a {
        self.entries.iter().filter(move |e| e.kind() == kind)
    }

    /// First entry with the given kind and change.
    pub fn find(&self, kind: &EntityKind, change: ChangeKind) -> Option<&DeltaEntry> {
        self.entries
            .iter()
            .find(|e| e.kind() == kind && e.change() == change)
    }

    /// Distinct kinds in first-appearance order.
    pub fn kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = Vec::new();
        for entry in &self.entries {
            if !kinds.contains(entry.kind()) {
                kinds.push(entry.kind().clone());
            }
        }
        kinds
    }

    /// Rendered summary of each entry.
    pub fn summaries(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.delta.summary()).collect()
    }
}

impl Extend<DeltaEntry> for Diff {
    fn extend<T: IntoIterator<Item = DeltaEntry>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

impl FromIterator<DeltaEntry> for Diff {
    fn from_iter<T: IntoIterator<Item = DeltaEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DeltaEntry;
    type IntoIter = std::slice::Iter<'a, DeltaEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
