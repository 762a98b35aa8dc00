//! Revision layer for Stave.
//!
//! Captures tracked items into [`RevisionItem`]s, stages them in a
//! [`HeadState`], freezes the head into a [`Revision`] and keeps committed
//! revisions in an in-memory [`History`] graph that can rebuild any item at
//! any revision and merge diverging branches.
//!
//! # Key Types
//!
//! - [`RevisionItem`] — Frozen deltas and payloads of one item, with its node codec
//! - [`HeadState`] — Staging map from item uuid to revision item
//! - [`Revision`] / [`History`] — Committed snapshots and their parent graph
//! - [`VcsConfig`] — Payload dedup and history traversal settings

pub mod config;
pub mod error;
pub mod head;
pub mod history;
pub mod item;
pub mod persist;

pub use config::VcsConfig;
pub use error::{RevisionError, RevisionResult};
pub use head::{HeadState, StageOutcome};
pub use history::{History, Revision};
pub use item::{ItemState, RevisionItem, RevisionItemKind};
