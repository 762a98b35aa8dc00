use serde::{Deserialize, Serialize};
use stave_types::Node;

use crate::error::RecordResult;
use crate::record::{beat_value, invalid, required_f64, required_str, required_u64, Record};

/// A key change at a beat position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySignature {
    pub id: String,
    pub beat: f64,
    /// Pitch class of the tonic, 0 = C through 11 = B.
    pub root_key: u8,
    /// Scale descriptor, e.g. `"major"`, `"dorian"`.
    pub scale: String,
}

impl KeySignature {
    pub fn new(id: impl Into<String>, beat: f64, root_key: u8, scale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            beat,
            root_key,
            scale: scale.into(),
        }
    }
}

impl Record for KeySignature {
    const KIND: &'static str = "keySignatures";
    const NODE_NAME: &'static str = "keySignature";
    const SINGULAR: &'static str = "key signature";
    const PLURAL: &'static str = "key signatures";

    fn id(&self) -> &str {
        &self.id
    }

    fn beat(&self) -> f64 {
        self.beat
    }

    fn encode(&self) -> Node {
        Node::new(Self::NODE_NAME)
            .with_property("id", self.id.as_str())
            .with_property("beat", beat_value(Self::KIND, &self.id, self.beat))
            .with_property("rootKey", self.root_key)
            .with_property("scale", self.scale.as_str())
    }

    fn decode(node: &Node) -> RecordResult<Self> {
        let root_key = required_u64(node, "rootKey")?;
        if root_key > 11 {
            return Err(invalid("rootKey", "pitch class must be 0..=11"));
        }
        Ok(Self {
            id: required_str(node, "id")?,
            beat: required_f64(node, "beat")?,
            root_key: root_key as u8,
            scale: required_str(node, "scale")?,
        })
    }
}
