use serde::{Deserialize, Serialize};
use stave_types::Node;

use crate::error::RecordResult;
use crate::record::{beat_value, invalid, required_f64, required_str, required_u64, Record};

/// A meter change at a beat position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub id: String,
    pub beat: f64,
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(id: impl Into<String>, beat: f64, numerator: u32, denominator: u32) -> Self {
        Self {
            id: id.into(),
            beat,
            numerator,
            denominator,
        }
    }
}

impl Record for TimeSignature {
    const KIND: &'static str = "timeSignatures";
    const NODE_NAME: &'static str = "timeSignature";
    const SINGULAR: &'static str = "time signature";
    const PLURAL: &'static str = "time signatures";

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
            .with_property("numerator", self.numerator)
            .with_property("denominator", self.denominator)
    }

    fn decode(node: &Node) -> RecordResult<Self> {
        let numerator = u32::try_from(required_u64(node, "numerator")?)
            .map_err(|_| invalid("numerator", "out of range"))?;
        let denominator = u32::try_from(required_u64(node, "denominator")?)
            .map_err(|_| invalid("denominator", "out of range"))?;
        if numerator == 0 {
            return Err(invalid("numerator", "must be at least 1"));
        }
        if !denominator.is_power_of_two() {
            return Err(invalid("denominator", "must be a power of two"));
        }
        Ok(Self {
            id: required_str(node, "id")?,
            beat: required_f64(node, "beat")?,
            numerator,
            denominator,
        })
    }
}
