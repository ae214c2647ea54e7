//! Portable node tree — the serialization unit for one entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Root attribute that marks a node as a deletion tombstone.
const STATE_ATTRIBUTE: &str = "state";
const STATE_DELETED: &str = "deleted";

/// A named attribute on a node or element.
///
/// Attributes are kept in a `Vec` rather than a map so that serialization
/// order is stable and the round-trip invariant holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttribute {
    pub name: String,
    pub value: String,
}

impl NodeAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named element inside a portable node: ordered attributes, an optional
/// text value, and nested children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<NodeAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeElement>,
}

impl NodeElement {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Create an element holding a text value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// Add an attribute, returning self for chaining.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(NodeAttribute::new(name, value));
        self
    }

    /// Add a child element, returning self for chaining.
    pub fn child(mut self, child: NodeElement) -> Self {
        self.children.push(child);
        self
    }

    /// Find the first direct child with the given name.
    pub fn find(&self, name: &str) -> Option<&NodeElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text value of the first direct child with the given name.
    pub fn find_value(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|c| c.value.as_deref())
    }

    /// Value of a named attribute on this element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// The portable tree representation of one entity.
///
/// Every node carries a typed root `name`, a stable `key` (GUID), and an
/// optional `parent` path reference so files can be relocated on disk
/// without losing tree position. Named attributes and nested elements are
/// ordered.
///
/// # Round-trip invariant
///
/// `to_text` followed by `from_text` followed by `to_text` is byte-identical
/// for every valid node. Change detection relies on this: two nodes are
/// unchanged exactly when their serialized text matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableNode {
    pub name: String,
    pub key: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<NodeAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeElement>,
}

impl PortableNode {
    /// Create an empty node with the given root name and key.
    pub fn new(name: impl Into<String>, key: Uuid) -> Self {
        Self {
            name: name.into(),
            key,
            parent: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a deletion tombstone for an entity that no longer exists.
    pub fn tombstone(name: impl Into<String>, key: Uuid) -> Self {
        Self::new(name, key).attr(STATE_ATTRIBUTE, STATE_DELETED)
    }

    /// True when this node marks a deleted entity rather than content.
    pub fn is_tombstone(&self) -> bool {
        self.attribute(STATE_ATTRIBUTE) == Some(STATE_DELETED)
    }

    /// Set the parent path reference, returning self for chaining.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add a root attribute, returning self for chaining.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(NodeAttribute::new(name, value));
        self
    }

    /// Add a child element, returning self for chaining.
    pub fn child(mut self, child: NodeElement) -> Self {
        self.children.push(child);
        self
    }

    /// Value of a named root attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Find the first top-level element with the given name.
    pub fn find(&self, name: &str) -> Option<&NodeElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text value of the first top-level element with the given name.
    pub fn find_value(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|c| c.value.as_deref())
    }

    /// Resolve a slash-separated element path like `/Info/Name`.
    pub fn at_path(&self, path: &str) -> Option<&NodeElement> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = self.find(first)?;
        for segment in segments {
            current = current.find(segment)?;
        }
        Some(current)
    }

    /// Serialize to canonical text.
    ///
    /// The output is pretty-printed JSON with a fixed field order and a
    /// trailing newline; identical trees always produce identical bytes.
    pub fn to_text(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Parse a node from serialized text.
    pub fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::parse(e.to_string()))
    }

    /// Parse and verify the root name matches the expected type tag.
    pub fn from_text_as(text: &str, expected: &str) -> Result<Self> {
        let node = Self::from_text(text)?;
        if node.name != expected {
            return Err(Error::WrongRoot {
                expected: expected.to_string(),
                found: node.name,
            });
        }
        Ok(node)
    }
}
