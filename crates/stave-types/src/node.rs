//! The structured node every payload and persisted revision is built from.
//!
//! A [`Node`] is a named tree: an ordered map of JSON-valued properties plus
//! an ordered list of child nodes. Equality is purely structural, so two
//! nodes built independently from the same records compare equal. The
//! engine relies on this to tell "nothing really changed" apart from
//! "different object holding the same data".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::payload::PayloadId;

/// A named, ordered tree of key/value properties and child nodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node type name (e.g. `"annotations"`, `"annotation"`, `"delta"`).
    pub name: String,
    /// Properties, ordered by key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    /// Child nodes in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Set (or overwrite) a property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Look up a property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Look up a string property.
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(Value::as_str)
    }

    /// Look up an integer property.
    pub fn i64_property(&self, key: &str) -> Option<i64> {
        self.property(key).and_then(Value::as_i64)
    }

    /// Returns `true` if the property is present.
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Append a child node.
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// All children.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the node has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Structural equivalence: same name, same properties, same children in
    /// the same order.
    pub fn is_equivalent_to(&self, other: &Node) -> bool {
        self == other
    }

    /// Content-addressed id of this node.
    ///
    /// The hash input is the node's canonical JSON text: object keys are
    /// sorted and strings are escaped, so distinct nodes never share an input.
    pub fn content_id(&self) -> PayloadId {
        PayloadId::from_bytes(self.canonical_value().to_string().as_bytes())
    }

    fn canonical_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("name".into(), Value::String(self.name.clone()));
        if !self.properties.is_empty() {
            let properties: Map<String, Value> = self
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            object.insert("properties".into(), Value::Object(properties));
        }
        if !self.children.is_empty() {
            let children = self.children.iter().map(Node::canonical_value).collect();
            object.insert("children".into(), Value::Array(children));
        }
        Value::Object(object)
    }

    /// Encode as JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(data).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
