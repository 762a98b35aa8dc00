//! Merge engine for Stave.
//!
//! Implements the three-way merge of a diverging branch against its common
//! ancestor: every kind the ancestor knows is folded with the branch deltas
//! of the same kind, and kinds only the branch knows are adopted from an
//! empty state (schema upgrade). The result is a [`Diff`](stave_diff::Diff)
//! with one merged delta per reconciled kind.

pub mod error;
pub mod merge;
pub mod report;

pub use error::{MergeError, MergeResult};
pub use merge::{MergedItem, ThreeWayMerge};
pub use report::{KindOutcome, MergeReport};
