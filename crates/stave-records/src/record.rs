//! The record contract and the field helpers record codecs share.

use std::fmt;

use stave_types::{EntityKind, Node};
use tracing::warn;

use crate::error::{RecordError, RecordResult};

/// A uniquely-id'd, versionable leaf value of one entity kind.
///
/// Identity is [`id`](Record::id); everything else is content, compared by
/// [`same_content`](Record::same_content) for change detection. Each kind
/// also supplies its node codec.
pub trait Record: Clone + fmt::Debug + PartialEq {
    /// Entity kind tag, also the name of the payload node.
    const KIND: &'static str;
    /// Name of one record's node inside a payload.
    const NODE_NAME: &'static str;
    /// Singular noun used in descriptions.
    const SINGULAR: &'static str;
    /// Plural noun used in descriptions.
    const PLURAL: &'static str;

    fn id(&self) -> &str;

    /// Position on the timeline, used for deterministic ordering.
    fn beat(&self) -> f64;

    /// Content equality for records sharing an id.
    fn same_content(&self, other: &Self) -> bool {
        self == other
    }

    /// Encode as a record node.
    fn encode(&self) -> Node;

    /// Decode from a record node.
    fn decode(node: &Node) -> RecordResult<Self>;

    /// The kind tag as an [`EntityKind`].
    fn entity_kind() -> EntityKind {
        EntityKind::new(Self::KIND)
    }
}

/// Stable sort by beat, then by id.
pub fn sort_records<R: Record>(records: &mut [R]) {
    records.sort_by(|a, b| a.beat().total_cmp(&b.beat()).then_with(|| a.id().cmp(b.id())));
}

/// Beat value for a record node. JSON has no NaN or infinity, so a
/// non-finite beat would encode as `null` and fail to decode.
pub(crate) fn beat_value(kind: &str, id: &str, beat: f64) -> f64 {
    debug_assert!(beat.is_finite(), "non-finite beat {beat} on {kind} record {id}");
    if !beat.is_finite() {
        warn!(kind, id, beat, "encoding non-finite beat; the record will not decode");
    }
    beat
}

pub(crate) fn required_str(node: &Node, field: &str) -> RecordResult<String> {
    match node.property(field) {
        None => Err(missing(node, field)),
        Some(value) => value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid(field, "expected a string")),
    }
}

pub(crate) fn required_f64(node: &Node, field: &str) -> RecordResult<f64> {
    match node.property(field) {
        None => Err(missing(node, field)),
        Some(value) => value
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(field, "expected a finite number")),
    }
}

pub(crate) fn required_u64(node: &Node, field: &str) -> RecordResult<u64> {
    match node.property(field) {
        None => Err(missing(node, field)),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| invalid(field, "expected a non-negative integer")),
    }
}

pub(crate) fn invalid(field: &str, reason: &str) -> RecordError {
    RecordError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(node: &Node, field: &str) -> RecordError {
    RecordError::MissingField {
        node: node.name.clone(),
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Annotation;

    #[test]
    fn sort_by_beat_then_id() {
        let mut records = vec![
            Annotation::new("b", 4.0, "Bridge"),
            Annotation::new("z", 0.0, "Intro"),
            Annotation::new("a", 4.0, "Break"),
        ];
        sort_records(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["z", "a", "b"]);
    }

    #[test]
    fn field_helpers_report_missing_and_invalid() {
        let node = Node::new("annotation")
            .with_property("text", 3)
            .with_property("beat", "soon");
        assert_eq!(
            required_str(&node, "id"),
            Err(RecordError::MissingField {
                node: "annotation".into(),
                field: "id".into()
            })
        );
        assert!(matches!(
            required_str(&node, "text"),
            Err(RecordError::InvalidField { .. })
        ));
        assert!(matches!(
            required_f64(&node, "beat"),
            Err(RecordError::InvalidField { .. })
        ));
    }

    #[test]
    fn integers_decode_as_f64() {
        let node = Node::new("annotation").with_property("beat", 8);
        assert_eq!(required_f64(&node, "beat"), Ok(8.0));
    }

    #[test]
    fn negative_is_not_u64() {
        let node = Node::new("timeSignature").with_property("numerator", -3);
        assert!(required_u64(&node, "numerator").is_err());
    }
}
