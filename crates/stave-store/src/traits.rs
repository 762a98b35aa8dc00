use stave_types::{Node, PayloadId};

use crate::error::StoreResult;

/// Content-addressed payload store.
///
/// Implementations must satisfy these invariants:
/// - Payloads are immutable once written: the same content always maps to
///   the same [`PayloadId`].
/// - Writes are idempotent.
/// - Nothing ever mutates a stored payload in place, so readers may share
///   what they read freely.
pub trait PayloadStore: Send + Sync {
    /// Read a payload by id. Returns `Ok(None)` if it does not exist.
    fn read(&self, id: &PayloadId) -> StoreResult<Option<Node>>;

    /// Write a payload and return its content id.
    fn write(&self, payload: &Node) -> StoreResult<PayloadId>;

    /// Check whether a payload exists.
    fn exists(&self, id: &PayloadId) -> StoreResult<bool>;

    /// Read several payloads.
    ///
    /// Default implementation calls `read()` for each id.
    fn read_batch(&self, ids: &[PayloadId]) -> StoreResult<Vec<Option<Node>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }
}
