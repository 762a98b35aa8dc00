//! The composite timeline: annotations, time signatures and key signatures
//! of one project, versioned as a single tracked item.

use serde::{Deserialize, Serialize};
use stave_types::{ChangeKind, Delta, EntityKind, ItemUuid, Node, TrackedItem};
use tracing::warn;

use crate::annotation::Annotation;
use crate::key_signature::KeySignature;
use crate::payload::{decode_payload, delta_for, encode_payload};
use crate::record::{sort_records, Record};
use crate::time_signature::TimeSignature;

/// Project timeline state. Also the on-disk project format used by the CLI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    #[serde(default)]
    pub uuid: ItemUuid,
    #[serde(default = "Timeline::default_name")]
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub time_signatures: Vec<TimeSignature>,
    #[serde(default)]
    pub key_signatures: Vec<KeySignature>,
}

impl Timeline {
    /// Diff logic tag of the composite item.
    pub const DIFF_LOGIC: &'static str = "timeline";

    fn default_name() -> String {
        "Timeline".to_string()
    }

    /// Empty timeline with a fresh uuid.
    pub fn new() -> Self {
        Self::with_uuid(ItemUuid::new())
    }

    /// Empty timeline with a known uuid.
    pub fn with_uuid(uuid: ItemUuid) -> Self {
        Self {
            uuid,
            name: Self::default_name(),
            annotations: Vec::new(),
            time_signatures: Vec::new(),
            key_signatures: Vec::new(),
        }
    }

    /// Sort every record list by beat, then id.
    pub fn normalize(&mut self) {
        sort_records(&mut self.annotations);
        sort_records(&mut self.time_signatures);
        sort_records(&mut self.key_signatures);
    }

    fn restore<R: Record>(target: &mut Vec<R>, payload: &Node) -> bool {
        match decode_payload::<R>(payload) {
            Ok(mut records) => {
                sort_records(&mut records);
                *target = records;
                true
            }
            Err(e) => {
                warn!(kind = R::KIND, error = %e, "refusing to restore timeline payload");
                false
            }
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedItem for Timeline {
    fn uuid(&self) -> ItemUuid {
        self.uuid
    }

    fn vcs_name(&self) -> String {
        self.name.clone()
    }

    fn diff_logic(&self) -> String {
        Self::DIFF_LOGIC.to_string()
    }

    fn deltas(&self) -> Vec<Delta> {
        vec![
            delta_for(ChangeKind::Full, &self.annotations).0,
            delta_for(ChangeKind::Full, &self.time_signatures).0,
            delta_for(ChangeKind::Full, &self.key_signatures).0,
        ]
    }

    fn delta_payload(&self, index: usize) -> Option<Node> {
        match index {
            0 => Some(encode_payload(&self.annotations)),
            1 => Some(encode_payload(&self.time_signatures)),
            2 => Some(encode_payload(&self.key_signatures)),
            _ => None,
        }
    }

    fn restore_payload(&mut self, kind: &EntityKind, payload: &Node) -> bool {
        match kind.as_str() {
            Annotation::KIND => Self::restore(&mut self.annotations, payload),
            TimeSignature::KIND => Self::restore(&mut self.time_signatures, payload),
            KeySignature::KIND => Self::restore(&mut self.key_signatures, payload),
            _ => false,
        }
    }
}
