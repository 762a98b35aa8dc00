//! Conversion between record lists and payload nodes, and the delta that
//! describes a payload.

use std::collections::HashSet;

use stave_types::{ChangeKind, Delta, DeltaType, Description, Node};
use tracing::warn;

use crate::error::{RecordError, RecordResult};
use crate::record::Record;

/// Encode records as a payload node named after the entity kind.
pub fn encode_payload<R: Record>(records: &[R]) -> Node {
    let mut payload = Node::new(R::KIND);
    for record in records {
        payload.add_child(record.encode());
    }
    payload
}

/// Decode a payload node into records.
///
/// A payload of another kind is an error. Malformed children and repeated
/// ids are skipped (the first record with an id wins) so that the rest of
/// the payload still loads.
pub fn decode_payload<R: Record>(payload: &Node) -> RecordResult<Vec<R>> {
    if payload.name != R::KIND {
        return Err(RecordError::KindMismatch {
            expected: R::KIND.to_string(),
            actual: payload.name.clone(),
        });
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(payload.len());
    for child in payload.children() {
        if child.name != R::NODE_NAME {
            warn!(kind = R::KIND, node = %child.name, "skipping foreign node in payload");
            continue;
        }
        match R::decode(child) {
            Ok(record) => {
                if seen.insert(record.id().to_string()) {
                    records.push(record);
                } else {
                    warn!(kind = R::KIND, id = record.id(), "skipping duplicate record id");
                }
            }
            Err(e) => warn!(kind = R::KIND, error = %e, "skipping malformed record"),
        }
    }
    Ok(records)
}

/// Description template for a change of this record kind.
pub fn describe<R: Record>(change: ChangeKind) -> Description {
    let (singular, plural) = (R::SINGULAR, R::PLURAL);
    match change {
        ChangeKind::Full => Description::new(format!("{{x}} {singular}"), format!("{{x}} {plural}")),
        ChangeKind::Merged => Description::new(
            format!("{{x}} merged {singular}"),
            format!("{{x}} merged {plural}"),
        ),
        other => Description::new(
            format!("{{x}} {singular} {other}"),
            format!("{{x}} {plural} {other}"),
        ),
    }
}

/// Build the delta and payload describing `records` under `change`.
pub fn delta_for<R: Record>(change: ChangeKind, records: &[R]) -> (Delta, Node) {
    let delta = Delta::new(
        DeltaType::new(R::KIND, change),
        describe::<R>(change),
        records.len() as i64,
    );
    (delta, encode_payload(records))
}
