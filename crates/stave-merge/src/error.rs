//! Error types for the merge crate.

use stave_diff::DiffError;

/// Errors that can occur during a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A payload could not be diffed or folded.
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
