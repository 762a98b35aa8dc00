use std::collections::HashMap;

use stave_records::{Annotation, KeySignature, TimeSignature};
use stave_types::EntityKind;

use crate::logic::{EntityLogic, RecordLogic};

/// Map from entity kind to its handler.
///
/// Passed explicitly to everything that needs to dispatch on kind; there is
/// no global registry.
pub struct LogicRegistry {
    handlers: HashMap<EntityKind, Box<dyn EntityLogic>>,
}

impl LogicRegistry {
    /// A registry with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with the built-in record kinds.
    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self::empty();
        registry.register(RecordLogic::<Annotation>::new());
        registry.register(RecordLogic::<TimeSignature>::new());
        registry.register(RecordLogic::<KeySignature>::new());
        registry
    }

    /// Register a handler, replacing any previous handler for its kind.
    pub fn register(&mut self, logic: impl EntityLogic + 'static) {
        self.handlers.insert(logic.kind(), Box::new(logic));
    }

    /// Handler for a kind.
    pub fn get(&self, kind: &EntityKind) -> Option<&dyn EntityLogic> {
        self.handlers.get(kind).map(|h| h.as_ref())
    }

    /// Returns `true` if a handler is registered for the kind.
    pub fn contains(&self, kind: &EntityKind) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.handlers.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for LogicRegistry {
    fn default() -> Self {
        Self::with_builtin_kinds()
    }
}

impl std::fmt::Debug for LogicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
