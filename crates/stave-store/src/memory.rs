use std::collections::HashMap;
use std::sync::RwLock;

use stave_types::{Node, PayloadId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::PayloadStore;

/// Node name of an exported arena.
pub const EXPORT_NODE: &str = "payloads";
/// Node name of one exported arena entry.
pub const ENTRY_NODE: &str = "payload";

#[derive(Default)]
struct Arena {
    /// Payloads in write order. Slots are never reused.
    slots: Vec<Node>,
    /// Content id -> slot.
    index: HashMap<PayloadId, usize>,
}

/// In-memory, append-only payload arena.
///
/// Payloads sit in a `Vec` behind a `RwLock`; a `HashMap` maps each content
/// id to its slot. Reads clone the payload out of its slot.
pub struct InMemoryPayloadStore {
    arena: RwLock<Arena>,
}

impl InMemoryPayloadStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Arena::default()),
        }
    }

    /// Number of distinct payloads stored.
    pub fn len(&self) -> usize {
        self.arena.read().map(|a| a.slots.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot index of a payload, in write order.
    pub fn slot_of(&self, id: &PayloadId) -> StoreResult<Option<usize>> {
        let arena = self.arena.read().map_err(|_| StoreError::Poisoned)?;
        Ok(arena.index.get(id).copied())
    }

    /// All payload ids in write order.
    pub fn ids(&self) -> StoreResult<Vec<PayloadId>> {
        let arena = self.arena.read().map_err(|_| StoreError::Poisoned)?;
        Ok(arena.slots.iter().map(Node::content_id).collect())
    }

    /// Export the arena as a single node, one `payload` child per slot.
    pub fn export(&self) -> StoreResult<Node> {
        let arena = self.arena.read().map_err(|_| StoreError::Poisoned)?;
        let mut root = Node::new(EXPORT_NODE);
        for payload in &arena.slots {
            root.add_child(
                Node::new(ENTRY_NODE)
                    .with_property("id", payload.content_id().to_hex())
                    .with_child(payload.clone()),
            );
        }
        Ok(root)
    }

    /// Rebuild a store from an exported node, verifying every entry.
    pub fn import(node: &Node) -> StoreResult<Self> {
        if node.name != EXPORT_NODE {
            return Err(StoreError::CorruptEntry(format!(
                "expected {EXPORT_NODE}, got {}",
                node.name
            )));
        }
        let store = Self::new();
        for entry in node.children_named(ENTRY_NODE) {
            let hex = entry
                .str_property("id")
                .ok_or_else(|| StoreError::CorruptEntry("entry without id".into()))?;
            let expected = PayloadId::from_hex(hex)
                .map_err(|e| StoreError::CorruptEntry(e.to_string()))?;
            let payload = entry
                .children()
                .first()
                .ok_or_else(|| StoreError::CorruptEntry(format!("entry {hex} has no payload")))?;
            let computed = store.write(payload)?;
            if computed != expected {
                return Err(StoreError::HashMismatch { expected, computed });
            }
        }
        debug!(payloads = store.len(), "payload store imported");
        Ok(store)
    }
}

impl Default for InMemoryPayloadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadStore for InMemoryPayloadStore {
    fn read(&self, id: &PayloadId) -> StoreResult<Option<Node>> {
        let arena = self.arena.read().map_err(|_| StoreError::Poisoned)?;
        Ok(arena.index.get(id).map(|&slot| arena.slots[slot].clone()))
    }

    fn write(&self, payload: &Node) -> StoreResult<PayloadId> {
        let id = payload.content_id();
        let mut arena = self.arena.write().map_err(|_| StoreError::Poisoned)?;
        if !arena.index.contains_key(&id) {
            let slot = arena.slots.len();
            arena.slots.push(payload.clone());
            arena.index.insert(id, slot);
            debug!(id = %id.short_hex(), slot, "payload stored");
        }
        Ok(id)
    }

    fn exists(&self, id: &PayloadId) -> StoreResult<bool> {
        let arena = self.arena.read().map_err(|_| StoreError::Poisoned)?;
        Ok(arena.index.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryPayloadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPayloadStore")
            .field("payload_count", &self.len())
            .finish()
    }
}
