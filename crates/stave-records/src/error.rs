//! Error types for the records crate.

/// Errors that can occur while decoding records and payloads.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    /// A payload node belongs to a different entity kind.
    #[error("payload kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// A record node is missing a required property.
    #[error("record node {node} is missing field {field}")]
    MissingField { node: String, field: String },

    /// A record property is present but unusable.
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Convenience alias for record results.
pub type RecordResult<T> = Result<T, RecordError>;
