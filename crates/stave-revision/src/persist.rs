//! Node codec for revision items.
//!
//! A serialized revision item is a `revisionItem` node carrying the item's
//! identity as properties and one `delta` child per entry:
//!
//! ```text
//! revisionItem { uuid, revisionItemType, revisionItemName, revisionItemDiffLogic }
//!   delta { deltaId, deltaType, deltaDescription, deltaDescriptionPlural, deltaCount }
//!     <payload node>            (only when no payload store is used)
//! ```
//!
//! `deltaId` is the payload's content id. With a [`PayloadStore`] the payload
//! is written to the store and the delta keeps only the id, so identical
//! payloads across revisions are stored once.
//!
//! Decoding is lenient per delta: a malformed delta, a delta of a kind no
//! handler is registered for, or a delta whose payload cannot be found is
//! dropped with a warning and the rest of the item is kept.

use std::fmt;
use std::str::FromStr;

use stave_diff::{DeltaEntry, LogicRegistry};
use stave_store::PayloadStore;
use stave_types::{Delta, DeltaType, Description, EntityKind, ItemUuid, Node, PayloadId};
use tracing::{debug, warn};

use crate::error::{RevisionError, RevisionResult};
use crate::item::{RevisionItem, RevisionItemKind};

pub const ROOT_NODE: &str = "revisionItem";
pub const DELTA_NODE: &str = "delta";

const UUID: &str = "uuid";
const ITEM_TYPE: &str = "revisionItemType";
const ITEM_NAME: &str = "revisionItemName";
const ITEM_DIFF_LOGIC: &str = "revisionItemDiffLogic";

const DELTA_ID: &str = "deltaId";
const DELTA_TYPE: &str = "deltaType";
const DELTA_DESCRIPTION: &str = "deltaDescription";
const DELTA_DESCRIPTION_PLURAL: &str = "deltaDescriptionPlural";
const DELTA_COUNT: &str = "deltaCount";

/// Why a single delta was left out while decoding.
enum Dropped {
    Malformed(String),
    UnknownKind(EntityKind),
    MissingPayload(PayloadId),
}

impl fmt::Display for Dropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed delta: {reason}"),
            Self::UnknownKind(kind) => write!(f, "no diff logic for kind {kind}"),
            Self::MissingPayload(id) => write!(f, "payload {} not found", id.short_hex()),
        }
    }
}

impl RevisionItem {
    /// Encode as a `revisionItem` node.
    ///
    /// With a store, payloads are written to it and referenced by content
    /// id; without one they are embedded under their delta.
    pub fn serialize(&self, store: Option<&dyn PayloadStore>) -> RevisionResult<Node> {
        let mut root = Node::new(ROOT_NODE)
            .with_property(UUID, self.uuid.to_string())
            .with_property(ITEM_TYPE, self.kind.code())
            .with_property(ITEM_NAME, self.name.clone())
            .with_property(ITEM_DIFF_LOGIC, self.diff_logic.clone());

        for entry in &self.entries {
            let description = &entry.delta.description;
            let mut delta = Node::new(DELTA_NODE)
                .with_property(DELTA_TYPE, entry.delta.delta_type.to_string())
                .with_property(DELTA_DESCRIPTION, description.singular.clone())
                .with_property(DELTA_DESCRIPTION_PLURAL, description.plural.clone())
                .with_property(DELTA_COUNT, entry.delta.count);

            let id = match store {
                Some(store) => store.write(&entry.payload)?,
                None => {
                    delta.add_child(entry.payload.clone());
                    entry.payload.content_id()
                }
            };
            delta.set_property(DELTA_ID, id.to_hex());
            root.add_child(delta);
        }

        debug!(
            item = %self.uuid,
            deltas = self.entries.len(),
            shared = store.is_some(),
            "serialized revision item"
        );
        Ok(root)
    }

    /// Replace this item with the one encoded in `node`.
    ///
    /// The item is reset first. If `node` is not a revision item, or its
    /// identity properties are malformed, an error is returned and the item
    /// stays uninitialized. Individual deltas that cannot be decoded are
    /// dropped.
    pub fn deserialize(
        &mut self,
        node: &Node,
        store: Option<&dyn PayloadStore>,
        registry: &LogicRegistry,
    ) -> RevisionResult<()> {
        self.reset();

        if node.name != ROOT_NODE {
            return Err(RevisionError::NotARevisionItem(node.name.clone()));
        }

        let uuid = node
            .str_property(UUID)
            .ok_or_else(|| invalid(UUID, "missing"))?;
        let uuid = ItemUuid::from_str(uuid).map_err(|e| invalid(UUID, &e.to_string()))?;
        let kind = match node.property(ITEM_TYPE) {
            None => RevisionItemKind::Undefined,
            Some(value) => value
                .as_i64()
                .and_then(RevisionItemKind::from_code)
                .ok_or_else(|| invalid(ITEM_TYPE, "expected 0, 1, 2 or 3"))?,
        };
        let name = node.str_property(ITEM_NAME).unwrap_or_default();
        let diff_logic = node.str_property(ITEM_DIFF_LOGIC).unwrap_or_default();

        let mut entries = Vec::new();
        for (index, delta) in node.children_named(DELTA_NODE).enumerate() {
            match decode_delta(delta, store, registry)? {
                Ok(entry) => entries.push(entry),
                Err(reason) => warn!(item = %uuid, index, %reason, "dropping delta"),
            }
        }

        *self = Self::from_parts(uuid, name, kind, diff_logic, entries);
        debug!(item = %uuid, deltas = self.entries.len(), "deserialized revision item");
        Ok(())
    }

    /// Decode a new item from `node`.
    pub fn from_node(
        node: &Node,
        store: Option<&dyn PayloadStore>,
        registry: &LogicRegistry,
    ) -> RevisionResult<Self> {
        let mut item = Self::new();
        item.deserialize(node, store, registry)?;
        Ok(item)
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self, store: Option<&dyn PayloadStore>) -> RevisionResult<Vec<u8>> {
        self.serialize(store)?
            .to_json()
            .map_err(|e| RevisionError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(
        data: &[u8],
        store: Option<&dyn PayloadStore>,
        registry: &LogicRegistry,
    ) -> RevisionResult<Self> {
        let node = Node::from_json(data).map_err(|e| RevisionError::Serialization(e.to_string()))?;
        Self::from_node(&node, store, registry)
    }
}

/// Decode one delta node. The outer error is a store failure; the inner one
/// names why this delta alone is dropped.
fn decode_delta(
    node: &Node,
    store: Option<&dyn PayloadStore>,
    registry: &LogicRegistry,
) -> RevisionResult<Result<DeltaEntry, Dropped>> {
    let delta = match delta_header(node) {
        Ok(delta) => delta,
        Err(reason) => return Ok(Err(Dropped::Malformed(reason))),
    };
    if !registry.contains(delta.kind()) {
        return Ok(Err(Dropped::UnknownKind(delta.kind().clone())));
    }

    let id = match node.str_property(DELTA_ID).map(PayloadId::from_hex) {
        Some(Ok(id)) => id,
        Some(Err(e)) => return Ok(Err(Dropped::Malformed(format!("{DELTA_ID}: {e}")))),
        None => return Ok(Err(Dropped::Malformed(format!("{DELTA_ID} missing")))),
    };

    let payload = match node.children().first() {
        Some(inline) => {
            if inline.content_id() != id {
                return Ok(Err(Dropped::Malformed(format!(
                    "embedded payload does not match {}",
                    id.short_hex()
                ))));
            }
            inline.clone()
        }
        None => match store {
            Some(store) => match store.read(&id)? {
                Some(payload) => payload,
                None => return Ok(Err(Dropped::MissingPayload(id))),
            },
            None => return Ok(Err(Dropped::MissingPayload(id))),
        },
    };

    if payload.name != delta.kind().as_str() {
        return Ok(Err(Dropped::Malformed(format!(
            "payload node {} under {} delta",
            payload.name,
            delta.kind()
        ))));
    }

    Ok(Ok(DeltaEntry::new(delta, payload)))
}

fn delta_header(node: &Node) -> Result<Delta, String> {
    let delta_type = node
        .str_property(DELTA_TYPE)
        .ok_or_else(|| format!("{DELTA_TYPE} missing"))?
        .parse::<DeltaType>()
        .map_err(|e| e.to_string())?;
    let count = node
        .i64_property(DELTA_COUNT)
        .ok_or_else(|| format!("{DELTA_COUNT} missing"))?;
    let description = Description::new(
        node.str_property(DELTA_DESCRIPTION).unwrap_or_default(),
        node.str_property(DELTA_DESCRIPTION_PLURAL).unwrap_or_default(),
    );
    Ok(Delta::new(delta_type, description, count))
}

fn invalid(field: &str, reason: &str) -> RevisionError {
    RevisionError::InvalidProperty {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stave_records::{Annotation, KeySignature, TimeSignature, Timeline};
    use stave_store::InMemoryPayloadStore;
    use stave_types::TrackedItem;

    fn item() -> RevisionItem {
        let mut timeline = Timeline::new();
        timeline.name = "Song".into();
        timeline.annotations = vec![
            Annotation::new("a1", 0.0, "Verse"),
            Annotation::new("a2", 4.0, "Bridge").with_colour("#ff8800"),
        ];
        timeline.time_signatures = vec![TimeSignature::new("t1", 0.0, 6, 8)];
        timeline.key_signatures = vec![KeySignature::new("k1", 0.0, 7, "dorian")];
        RevisionItem::from_tracked(&timeline)
    }

    #[test]
    fn node_shape() {
        let node = item().serialize(None).unwrap();
        assert_eq!(node.name, ROOT_NODE);
        assert_eq!(node.i64_property(ITEM_TYPE), Some(1));
        assert_eq!(node.str_property(ITEM_NAME), Some("Song"));
        assert_eq!(node.str_property(ITEM_DIFF_LOGIC), Some("timeline"));

        let delta = node.child(DELTA_NODE).unwrap();
        assert_eq!(delta.str_property(DELTA_TYPE), Some("annotations"));
        assert_eq!(delta.str_property(DELTA_DESCRIPTION), Some("{x} annotation"));
        assert_eq!(delta.str_property(DELTA_DESCRIPTION_PLURAL), Some("{x} annotations"));
        assert_eq!(delta.i64_property(DELTA_COUNT), Some(2));
        let payload = &delta.children()[0];
        assert_eq!(
            delta.str_property(DELTA_ID),
            Some(payload.content_id().to_hex().as_str())
        );
    }

    #[test]
    fn inline_roundtrip() {
        let original = item();
        let node = original.serialize(None).unwrap();
        let decoded = RevisionItem::from_node(&node, None, &LogicRegistry::default()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn shared_payloads_are_stored_once() {
        let store = InMemoryPayloadStore::new();
        let original = item();
        let first = original.serialize(Some(&store)).unwrap();
        let second = original.serialize(Some(&store)).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(first, second);
        assert!(first.children().iter().all(|d| d.children().is_empty()));

        let decoded =
            RevisionItem::from_node(&first, Some(&store), &LogicRegistry::default()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn unknown_kinds_are_dropped() {
        let mut registry = LogicRegistry::empty();
        registry.register(stave_diff::RecordLogic::<Annotation>::new());
        let node = item().serialize(None).unwrap();

        let decoded = RevisionItem::from_node(&node, None, &registry).unwrap();
        let kinds: Vec<String> = decoded.deltas().iter().map(|d| d.kind().to_string()).collect();
        assert_eq!(kinds, ["annotations"]);
    }

    #[test]
    fn missing_payloads_are_dropped() {
        let store = InMemoryPayloadStore::new();
        let node = item().serialize(Some(&store)).unwrap();
        // Decoding without the store leaves every payload unresolved.
        let decoded = RevisionItem::from_node(&node, None, &LogicRegistry::default()).unwrap();
        assert!(decoded.entries().is_empty());
        assert_eq!(decoded.name(), "Song");

        let empty = InMemoryPayloadStore::new();
        let decoded =
            RevisionItem::from_node(&node, Some(&empty), &LogicRegistry::default()).unwrap();
        assert!(decoded.entries().is_empty());
    }

    #[test]
    fn malformed_deltas_are_dropped() {
        let mut node = item().serialize(None).unwrap();
        node.children[0].set_property(DELTA_TYPE, "annotations:exploded");
        node.children[1].properties.remove(DELTA_COUNT);
        node.children[2].children[0].set_property("tampered", true);

        let decoded = RevisionItem::from_node(&node, None, &LogicRegistry::default()).unwrap();
        assert!(decoded.entries().is_empty());
    }

    #[test]
    fn foreign_nodes_are_rejected() {
        let mut decoded = item();
        let err = decoded
            .deserialize(&Node::new("project"), None, &LogicRegistry::default())
            .unwrap_err();
        assert!(matches!(err, RevisionError::NotARevisionItem(ref name) if name == "project"));
        assert_eq!(decoded, RevisionItem::new());

        let bad_uuid = Node::new(ROOT_NODE).with_property(UUID, "not-a-uuid");
        assert!(matches!(
            RevisionItem::from_node(&bad_uuid, None, &LogicRegistry::default()),
            Err(RevisionError::InvalidProperty { .. })
        ));

        let bad_type = item()
            .serialize(None)
            .unwrap()
            .with_property(ITEM_TYPE, 9);
        assert!(matches!(
            RevisionItem::from_node(&bad_type, None, &LogicRegistry::default()),
            Err(RevisionError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn json_roundtrip() {
        let original = item();
        let bytes = original.to_json(None).unwrap();
        let decoded = RevisionItem::from_json(&bytes, None, &LogicRegistry::default()).unwrap();
        assert_eq!(decoded, original);
        assert!(RevisionItem::from_json(b"{", None, &LogicRegistry::default()).is_err());
    }

    #[test]
    fn json_roundtrip_keeps_exact_beats() {
        for beat in [108881.85599191817, 113741.11104937493, 120293.59656522289, 0.1 + 0.2] {
            let mut timeline = Timeline::new();
            timeline.annotations = vec![Annotation::new("a1", beat, "Cue")];
            let original = RevisionItem::from_tracked(&timeline);

            let bytes = original.to_json(None).unwrap();
            let decoded =
                RevisionItem::from_json(&bytes, None, &LogicRegistry::default()).unwrap();
            assert_eq!(decoded.entries().len(), original.entries().len(), "beat {beat}");
            assert_eq!(decoded, original);
        }
    }
}
