//! Versionable records and the per-kind diff/merge functions over them.
//!
//! A [`Record`] is a uniquely-id'd leaf value of one entity kind. The crate
//! implements the record-level algorithms once, generically:
//!
//! - [`diff_records`] splits two record sets into added / removed / changed buckets
//! - [`merge_added`], [`merge_removed`], [`merge_changed`] fold one bucket onto an ancestor
//! - [`encode_payload`] / [`decode_payload`] convert between records and payload nodes
//!
//! Concrete kinds are [`Annotation`], [`TimeSignature`] and [`KeySignature`].
//! [`RecordTrack`] and [`Timeline`] are the live components that expose them
//! through the [`TrackedItem`](stave_types::TrackedItem) contract.

pub mod annotation;
pub mod diff;
pub mod error;
pub mod key_signature;
pub mod merge;
pub mod payload;
pub mod record;
pub mod time_signature;
pub mod timeline;
pub mod track;

pub use annotation::Annotation;
pub use diff::{diff_records, RecordDiff};
pub use error::{RecordError, RecordResult};
pub use key_signature::KeySignature;
pub use merge::{merge_added, merge_changed, merge_removed};
pub use payload::{decode_payload, delta_for, describe, encode_payload};
pub use record::{sort_records, Record};
pub use time_signature::TimeSignature;
pub use timeline::Timeline;
pub use track::{AnnotationsTrack, KeySignaturesTrack, RecordTrack, TimeSignaturesTrack};
