//! The serializer capability and shared conversion helpers

use serde_json::Value;
use sync_node::PortableNode;
use sync_store::{entity_path, resolve_path, Entity, EntityKind};

use crate::context::SerializeContext;
use crate::error::{Error, Result};

/// A declared cross-entity reference inside a portable node.
///
/// The orchestrator turns these into dependency-graph edges so referenced
/// entities import before the entities that need them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeReference {
    pub kind: EntityKind,
    pub path: String,
}

impl NodeReference {
    pub fn new(kind: EntityKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Conversion capability for one entity kind.
///
/// `serialize` and `deserialize` must be mutually idempotent: converting a
/// node to an entity and back yields the same portable text, including any
/// rewritten references.
pub trait EntitySerializer {
    /// The entity kind this serializer handles.
    fn kind(&self) -> EntityKind;

    /// Convert a live entity into its portable representation.
    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode>;

    /// Convert a portable node back into a live entity, resolving portable
    /// references to store-local ids.
    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity>;

    /// References that must exist before this node can import.
    ///
    /// The default declares only the parent path; kinds with intra-kind
    /// references (compositions, masters) add to it. References to kinds
    /// that import later by priority are deliberately NOT declared — those
    /// are instance-level forward references handled by the second pass.
    fn dependencies(&self, node: &PortableNode) -> Vec<NodeReference> {
        parent_reference(node, self.kind())
    }
}

/// The parent path as a dependency, when present.
pub fn parent_reference(node: &PortableNode, kind: EntityKind) -> Vec<NodeReference> {
    node.parent
        .as_deref()
        .map(|p| vec![NodeReference::new(kind, p)])
        .unwrap_or_default()
}

/// Start a portable node from the fields every entity shares: root name,
/// key, alias, and the parent path reference.
pub fn base_node(entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
    let mut node =
        PortableNode::new(entity.kind.node_root(), entity.key).attr("alias", &entity.name);

    if let Some(parent_id) = entity.parent_id {
        match ctx.cache.get(ctx.store, parent_id)? {
            Some(parent) => {
                node = node.with_parent(entity_path(ctx.store, ctx.cache, &parent)?);
            }
            None => {
                tracing::warn!(
                    id = entity.id,
                    parent_id,
                    "entity has a dangling parent id; omitting parent path"
                );
            }
        }
    }

    Ok(node)
}

/// Start a live entity from a portable node's shared fields.
///
/// An entity already known by key is used as the base so its store-local
/// id survives; otherwise a fresh unsaved entity is created. The parent
/// path, when present, must resolve — an unresolved parent is a deferrable
/// error.
pub fn base_entity(node: &PortableNode, kind: EntityKind, ctx: &SerializeContext<'_>) -> Result<Entity> {
    let name = node
        .attribute("alias")
        .ok_or_else(|| Error::missing_field(&node.name, "alias"))?;

    let mut entity = match ctx.cache.get_by_key(ctx.store, node.key)? {
        Some(existing) => existing,
        None => Entity::new(kind, name).with_key(node.key),
    };
    entity.name = name.to_string();
    entity.parent_id = None;

    if let Some(parent_path) = node.parent.as_deref() {
        match resolve_path(ctx.store, ctx.cache, kind, parent_path)? {
            Some(parent) => entity.parent_id = Some(parent.id),
            None => return Err(Error::unresolved(kind, parent_path)),
        }
    }

    Ok(entity)
}

/// Pass-through fallback for node roots with no registered serializer.
///
/// Keeps the raw payload intact under a single data key so unknown kinds
/// survive a report/export round without loss.
pub struct GenericSerializer {
    kind: EntityKind,
}

impl GenericSerializer {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind }
    }
}

impl EntitySerializer for GenericSerializer {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
        let mut node = base_node(entity, ctx)?;
        if !entity.data.is_empty() {
            let payload = serde_json::to_string(&Value::Object(entity.data.clone()))?;
            node = node.child(sync_node::NodeElement::with_value("Payload", payload));
        }
        Ok(node)
    }

    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity> {
        let mut entity = base_entity(node, self.kind, ctx)?;
        if let Some(payload) = node.find_value("Payload") {
            if let Value::Object(map) = serde_json::from_str(payload)? {
                entity.data = map;
            }
        }
        Ok(entity)
    }
}
