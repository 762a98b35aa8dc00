use stave_types::PayloadId;

/// Errors from payload store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested payload was not found.
    #[error("payload not found: {0}")]
    NotFound(PayloadId),

    /// An imported payload does not hash to the id it was stored under.
    #[error("hash mismatch: stored as {expected}, content hashes to {computed}")]
    HashMismatch {
        expected: PayloadId,
        computed: PayloadId,
    },

    /// An exported arena node is malformed.
    #[error("corrupt store entry: {0}")]
    CorruptEntry(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding the arena was poisoned by a panicking writer.
    #[error("payload store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
