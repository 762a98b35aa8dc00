//! Single-kind live tracks.

use stave_types::{ChangeKind, Delta, EntityKind, ItemUuid, Node, TrackedItem};
use tracing::warn;

use crate::annotation::Annotation;
use crate::key_signature::KeySignature;
use crate::payload::{decode_payload, delta_for, encode_payload};
use crate::record::{sort_records, Record};
use crate::time_signature::TimeSignature;

/// A live project component holding the records of one entity kind.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordTrack<R> {
    uuid: ItemUuid,
    name: String,
    records: Vec<R>,
}

pub type AnnotationsTrack = RecordTrack<Annotation>;
pub type TimeSignaturesTrack = RecordTrack<TimeSignature>;
pub type KeySignaturesTrack = RecordTrack<KeySignature>;

impl<R: Record> RecordTrack<R> {
    /// Create an empty track with a fresh uuid.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_uuid(ItemUuid::new(), name)
    }

    /// Create an empty track with a known uuid.
    pub fn with_uuid(uuid: ItemUuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Builder-style record insertion.
    pub fn with_records(mut self, records: impl IntoIterator<Item = R>) -> Self {
        for record in records {
            self.upsert(record);
        }
        self
    }

    /// Records in beat order.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Insert a record, replacing any record with the same id.
    pub fn upsert(&mut self, record: R) {
        match self.records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        sort_records(&mut self.records);
    }

    /// Remove a record by id, returning it.
    pub fn remove(&mut self, id: &str) -> Option<R> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: Record> TrackedItem for RecordTrack<R> {
    fn uuid(&self) -> ItemUuid {
        self.uuid
    }

    fn vcs_name(&self) -> String {
        self.name.clone()
    }

    fn diff_logic(&self) -> String {
        R::KIND.to_string()
    }

    fn deltas(&self) -> Vec<Delta> {
        vec![delta_for(ChangeKind::Full, &self.records).0]
    }

    fn delta_payload(&self, index: usize) -> Option<Node> {
        (index == 0).then(|| encode_payload(&self.records))
    }

    fn restore_payload(&mut self, kind: &EntityKind, payload: &Node) -> bool {
        if kind.as_str() != R::KIND {
            return false;
        }
        match decode_payload::<R>(payload) {
            Ok(mut records) => {
                sort_records(&mut records);
                self.records = records;
                true
            }
            Err(e) => {
                warn!(track = %self.name, error = %e, "refusing to restore payload");
                false
            }
        }
    }
}
