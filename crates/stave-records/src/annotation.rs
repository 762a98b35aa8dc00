use serde::{Deserialize, Serialize};
use stave_types::Node;

use crate::error::RecordResult;
use crate::record::{beat_value, required_f64, required_str, Record};

/// A text marker on the timeline ("Verse", "Chorus", ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub beat: f64,
    pub text: String,
    /// Display colour as a hex string; empty means the theme default.
    #[serde(default)]
    pub colour: String,
}

impl Annotation {
    pub fn new(id: impl Into<String>, beat: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            beat,
            text: text.into(),
            colour: String::new(),
        }
    }

    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = colour.into();
        self
    }
}

impl Record for Annotation {
    const KIND: &'static str = "annotations";
    const NODE_NAME: &'static str = "annotation";
    const SINGULAR: &'static str = "annotation";
    const PLURAL: &'static str = "annotations";

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
            .with_property("text", self.text.as_str())
            .with_property("colour", self.colour.as_str())
    }

    fn decode(node: &Node) -> RecordResult<Self> {
        Ok(Self {
            id: required_str(node, "id")?,
            beat: required_f64(node, "beat")?,
            text: required_str(node, "text")?,
            colour: node.str_property("colour").unwrap_or_default().to_string(),
        })
    }
}
