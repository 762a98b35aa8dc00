//! Error types for the diff crate.

use stave_types::EntityKind;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A payload could not be decoded as records of its kind.
    #[error("record error: {0}")]
    Record(#[from] stave_records::RecordError),

    /// No handler is registered for an entity kind.
    #[error("no diff logic registered for {0}")]
    UnknownKind(EntityKind),

    /// A live item refused a payload while a diff was applied to it.
    #[error("item {item} rejected payload of kind {kind}")]
    RestoreRejected { item: String, kind: EntityKind },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
