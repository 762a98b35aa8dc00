//! Payload storage for Stave revision history.
//!
//! Revision items written with a store keep only a reference (the payload's
//! content id) in their persisted node; the payload itself lives once in the
//! store, however many revisions point at it.
//!
//! # Design Rules
//!
//! 1. Payloads are immutable once written; the content id guarantees it.
//! 2. The arena is append-only: a payload's slot never moves or changes.
//! 3. Writing an existing payload is a no-op that returns the same id.
//! 4. Imported entries are verified against their content id.
//!
//! All backends implement the [`PayloadStore`] trait; [`InMemoryPayloadStore`]
//! is the arena used for sessions and tests.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryPayloadStore;
pub use traits::PayloadStore;
