//! Template serializer
//!
//! Template hierarchy is the master chain: a template's parent IS its
//! master layout, so the shared parent-path handling covers the reference.

use serde_json::json;
use sync_node::{NodeElement, PortableNode};
use sync_store::{Entity, EntityKind};

use crate::context::SerializeContext;
use crate::error::Result;
use crate::serializer::{base_entity, base_node, EntitySerializer};

pub struct TemplateSerializer;

impl EntitySerializer for TemplateSerializer {
    fn kind(&self) -> EntityKind {
        EntityKind::Template
    }

    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
        let body = entity.data_str("body").unwrap_or_default();
        Ok(base_node(entity, ctx)?.child(NodeElement::with_value("Body", body)))
    }

    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity> {
        let mut entity = base_entity(node, EntityKind::Template, ctx)?;
        entity.set_data("body", json!(node.find_value("Body").unwrap_or_default()));
        Ok(entity)
    }
}
