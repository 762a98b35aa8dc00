//! Foundation types for Stave, the embedded version-control engine of the
//! sequencer.
//!
//! Every other Stave crate depends on `stave-types`. Nothing here knows about
//! a concrete entity kind: records, diff functions and storage live in the
//! crates built on top.
//!
//! # Key Types
//!
//! - [`Node`] — Named, ordered tree of properties and children with structural equality
//! - [`PayloadId`] — Content-addressed identifier of a payload node (BLAKE3)
//! - [`ItemUuid`] / [`RevisionId`] — UUID v7 identifiers for tracked items and revisions
//! - [`EntityKind`] / [`ChangeKind`] / [`DeltaType`] — What a delta points at
//! - [`Delta`] / [`Description`] — Typed, described change-set marker
//! - [`TrackedItem`] — Contract every versionable project component implements

pub mod delta;
pub mod error;
pub mod identity;
pub mod node;
pub mod payload;
pub mod tracked;

pub use delta::{ChangeKind, Delta, DeltaType, Description, EntityKind};
pub use error::TypeError;
pub use identity::{ItemUuid, RevisionId};
pub use node::Node;
pub use payload::PayloadId;
pub use tracked::TrackedItem;
