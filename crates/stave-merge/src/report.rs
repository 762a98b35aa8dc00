//! What a merge did with each entity kind.

use std::fmt;

use serde::{Deserialize, Serialize};
use stave_types::EntityKind;

/// Outcome of merging one entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum KindOutcome {
    /// The branch had no delta of this kind; the ancestor state was kept.
    Carried,
    /// The ancestor state was folded with this many branch deltas.
    Folded { deltas: usize },
    /// The kind was new in the branch and built from an empty state.
    Adopted { deltas: usize },
    /// No handler is registered for the kind; it was left out.
    Skipped,
}

impl fmt::Display for KindOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Carried => f.write_str("carried"),
            Self::Folded { deltas } => write!(f, "folded {deltas} delta(s)"),
            Self::Adopted { deltas } => write!(f, "adopted from {deltas} delta(s)"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Per-kind record of a merge, in the order kinds were visited.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub kinds: Vec<(EntityKind, KindOutcome)>,
}

impl MergeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EntityKind, outcome: KindOutcome) {
        self.kinds.push((kind, outcome));
    }

    /// Outcome for a kind, if it was visited.
    pub fn outcome(&self, kind: &EntityKind) -> Option<KindOutcome> {
        self.kinds
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, outcome)| *outcome)
    }

    /// Kinds adopted through schema upgrade.
    pub fn adopted(&self) -> Vec<&EntityKind> {
        self.kinds
            .iter()
            .filter(|(_, o)| matches!(o, KindOutcome::Adopted { .. }))
            .map(|(k, _)| k)
            .collect()
    }

    /// Kinds left out for lack of a handler.
    pub fn skipped(&self) -> Vec<&EntityKind> {
        self.kinds
            .iter()
            .filter(|(_, o)| *o == KindOutcome::Skipped)
            .map(|(k, _)| k)
            .collect()
    }
}
