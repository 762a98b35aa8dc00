//! Revision items: frozen copies of a tracked item's deltas.

use std::fmt;

use serde::{Deserialize, Serialize};
use stave_diff::{DeltaEntry, Diff};
use stave_types::{Delta, ItemUuid, Node, TrackedItem};

/// How a revision item relates to the previous revision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevisionItemKind {
    #[default]
    Undefined,
    /// Full snapshot of a newly tracked item.
    Added,
    /// The item was dropped from the project.
    Removed,
    /// Delta diffs against the previous revision.
    Changed,
}

impl RevisionItemKind {
    /// Numeric code used in the persisted node.
    pub fn code(&self) -> i64 {
        match self {
            Self::Undefined => 0,
            Self::Added => 1,
            Self::Removed => 2,
            Self::Changed => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Undefined),
            1 => Some(Self::Added),
            2 => Some(Self::Removed),
            3 => Some(Self::Changed),
            _ => None,
        }
    }
}

impl fmt::Display for RevisionItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Undefined => "undefined",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        };
        f.write_str(s)
    }
}

/// Whether a revision item holds data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ItemState {
    #[default]
    Uninitialized,
    Populated,
}

/// Deltas and payloads of one tracked item, frozen at staging time.
///
/// Revision items implement [`TrackedItem`] themselves, so a committed
/// snapshot can serve as the baseline of the next diff.
#[derive(Clone, Debug, PartialEq)]
pub struct RevisionItem {
    pub(crate) uuid: ItemUuid,
    pub(crate) name: String,
    pub(crate) kind: RevisionItemKind,
    pub(crate) diff_logic: String,
    pub(crate) entries: Vec<DeltaEntry>,
    pub(crate) state: ItemState,
}

impl RevisionItem {
    /// An uninitialized item, ready to be filled by
    /// [`deserialize`](RevisionItem::deserialize).
    pub fn new() -> Self {
        Self {
            uuid: ItemUuid::nil(),
            name: String::new(),
            kind: RevisionItemKind::Undefined,
            diff_logic: String::new(),
            entries: Vec::new(),
            state: ItemState::Uninitialized,
        }
    }

    /// Full snapshot of a live item: every delta and payload is copied.
    pub fn from_tracked(item: &dyn TrackedItem) -> Self {
        let entries = item
            .delta_entries()
            .into_iter()
            .map(DeltaEntry::from)
            .collect();
        Self::with_entries(item, RevisionItemKind::Added, entries)
    }

    /// Capture a diff of `item` as a revision item of the given kind.
    pub fn from_diff(item: &dyn TrackedItem, diff: &Diff, kind: RevisionItemKind) -> Self {
        Self::with_entries(item, kind, diff.entries.clone())
    }

    /// Build an item directly from its parts.
    pub fn from_parts(
        uuid: ItemUuid,
        name: impl Into<String>,
        kind: RevisionItemKind,
        diff_logic: impl Into<String>,
        entries: Vec<DeltaEntry>,
    ) -> Self {
        Self {
            uuid,
            name: name.into(),
            kind,
            diff_logic: diff_logic.into(),
            entries,
            state: ItemState::Populated,
        }
    }

    fn with_entries(item: &dyn TrackedItem, kind: RevisionItemKind, entries: Vec<DeltaEntry>) -> Self {
        Self::from_parts(item.uuid(), item.vcs_name(), kind, item.diff_logic(), entries)
    }

    /// Drop all data and return to [`ItemState::Uninitialized`].
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    pub fn kind(&self) -> RevisionItemKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[DeltaEntry] {
        &self.entries
    }

    /// The entries as a [`Diff`].
    pub fn to_diff(&self) -> Diff {
        self.entries.iter().cloned().collect()
    }
}

impl Default for RevisionItem {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedItem for RevisionItem {
    fn uuid(&self) -> ItemUuid {
        self.uuid
    }

    fn vcs_name(&self) -> String {
        self.name.clone()
    }

    fn diff_logic(&self) -> String {
        self.diff_logic.clone()
    }

    fn deltas(&self) -> Vec<Delta> {
        self.entries.iter().map(|e| e.delta.clone()).collect()
    }

    fn delta_payload(&self, index: usize) -> Option<Node> {
        self.entries.get(index).map(|e| e.payload.clone())
    }
}
