//! Error types for the revision crate.

use stave_types::{ItemUuid, RevisionId};

/// Errors that can occur in the revision layer.
#[derive(Debug, thiserror::Error)]
pub enum RevisionError {
    /// An item with this uuid is already staged.
    #[error("item already staged: {0}")]
    AlreadyStaged(ItemUuid),

    /// No staged item has this uuid.
    #[error("item not found: {0}")]
    ItemNotFound(ItemUuid),

    /// The node handed to the decoder is not a revision item.
    #[error("not a revision item node: {0}")]
    NotARevisionItem(String),

    /// A revision item property is missing or malformed.
    #[error("invalid revision item property {field}: {reason}")]
    InvalidProperty { field: String, reason: String },

    /// A referenced revision is not in the history.
    #[error("revision not found: {0}")]
    RevisionNotFound(RevisionId),

    /// A revision with this id was already committed.
    #[error("duplicate revision: {0}")]
    DuplicateRevision(RevisionId),

    /// A revision names a parent the history does not contain.
    #[error("revision {revision} references missing parent {parent}")]
    DanglingParent {
        revision: RevisionId,
        parent: RevisionId,
    },

    /// A revision has more parents than a merge can have.
    #[error("revision {0} has more than two parents")]
    TooManyParents(RevisionId),

    /// Two revisions share no history.
    #[error("no common ancestor between {ours} and {theirs}")]
    NoCommonAncestor { ours: RevisionId, theirs: RevisionId },

    /// Neither side of a merge contains the item.
    #[error("item {item} not present on either side of the merge")]
    ItemMissing { item: ItemUuid },

    /// Diff error.
    #[error("diff error: {0}")]
    Diff(#[from] stave_diff::DiffError),

    /// Merge error.
    #[error("merge error: {0}")]
    Merge(#[from] stave_merge::MergeError),

    /// Payload store error.
    #[error("store error: {0}")]
    Store(#[from] stave_store::StoreError),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for revision results.
pub type RevisionResult<T> = Result<T, RevisionError>;
