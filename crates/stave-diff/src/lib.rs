//! Diff engine for Stave.
//!
//! Compares two snapshots of a tracked item and produces delta diffs, one
//! per non-empty added / removed / changed bucket of each entity kind, and
//! folds such diffs back onto a state.
//!
//! # Key Types
//!
//! - [`EntityLogic`] — Object-safe diff/merge handler for one entity kind
//! - [`RecordLogic`] — The generic handler for any [`Record`](stave_records::Record) kind
//! - [`LogicRegistry`] — Explicitly passed map from entity kind to handler
//! - [`Diff`] / [`DeltaEntry`] — A list of deltas with their payloads
//! - [`DiffLogic`] — `create_diff`, `fold`, `apply_diff`, `apply_to_item`

pub mod diff_logic;
pub mod entry;
pub mod error;
pub mod logic;
pub mod registry;

pub use diff_logic::DiffLogic;
pub use entry::{DeltaEntry, Diff};
pub use error::{DiffError, DiffResult};
pub use logic::{full_entry, EntityLogic, RecordLogic};
pub use registry::LogicRegistry;
