//! Language serializer
//!
//! Language entities are named by ISO code ("en-US"), which keeps every
//! cross-entity language reference portable without rewriting. The fallback
//! language is a same-kind reference and participates in import ordering.

use serde_json::json;
use sync_node::{NodeElement, PortableNode};
use sync_store::{Entity, EntityKind};

use crate::context::SerializeContext;
use crate::error::Result;
use crate::serializer::{base_entity, base_node, EntitySerializer, NodeReference};

pub struct LanguageSerializer;

impl EntitySerializer for LanguageSerializer {
    fn kind(&self) -> EntityKind {
        EntityKind::Language
    }

    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
        let mut info = NodeElement::new("Info");
        if let Some(culture) = entity.data_str("culture_name") {
            info = info.child(NodeElement::with_value("CultureName", culture));
        }
        if let Some(fallback) = entity.data_str("fallback") {
            info = info.child(NodeElement::with_value("Fallback", fallback));
        }

        Ok(base_node(entity, ctx)?.child(info))
    }

    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity> {
        let mut entity = base_entity(node, EntityKind::Language, ctx)?;
        entity.data.remove("culture_name");
        entity.data.remove("fallback");

        if let Some(info) = node.find("Info") {
            if let Some(culture) = info.find_value("CultureName") {
                entity.set_data("culture_name", json!(culture));
            }
            if let Some(fallback) = info.find_value("Fallback") {
                entity.set_data("fallback", json!(fallback));
            }
        }

        Ok(entity)
    }

    fn dependencies(&self, node: &PortableNode) -> Vec<NodeReference> {
        let mut references = crate::serializer::parent_reference(node, EntityKind::Language);
        if let Some(fallback) = node.find("Info").and_then(|i| i.find_value("Fallback")) {
            references.push(NodeReference::new(
                EntityKind::Language,
                format!("/{fallback}"),
            ));
        }
        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_store::{EntityCache, EntityStore, MemoryStore};

    #[test]
    fn test_round_trip_preserves_fields() {
        let store = MemoryStore::new();
        let cache = EntityCache::new();
        let ctx = SerializeContext::new(&store, &cache);

        let language = Entity::new(EntityKind::Language, "en-US")
            .with_data("culture_name", json!("English (United States)"))
            .with_data("fallback", json!("en"));
        let language = store.save(language).unwrap();

        let serializer = LanguageSerializer;
        let node = serializer.serialize(&language, &ctx).unwrap();
        let back = serializer.deserialize(&node, &ctx).unwrap();

        assert_eq!(back.name, "en-US");
        assert_eq!(back.key, language.key);
        assert_eq!(back.data_str("culture_name"), Some("English (United States)"));
        assert_eq!(back.data_str("fallback"), Some("en"));
    }

    #[test]
    fn test_fallback_is_a_dependency() {
        let store = MemoryStore::new();
        let cache = EntityCache::new();
        let ctx = SerializeContext::new(&store, &cache);

        let language = store
            .save(Entity::new(EntityKind::Language, "en-US").with_data("fallback", json!("en")))
            .unwrap();
        let node = LanguageSerializer.serialize(&language, &ctx).unwrap();

        let deps = LanguageSerializer.dependencies(&node);
        assert_eq!(deps, vec![NodeReference::new(EntityKind::Language, "/en")]);
    }
}
