//! Content-type serializer
//!
//! Properties carry data-type references and compositions carry same-kind
//! references; both travel as portable paths. Compositions are declared as
//! ordering dependencies so composed types import first.

use serde_json::{json, Value};
use sync_node::{NodeElement, PortableNode};
use sync_store::{entity_path, resolve_path, Entity, EntityKind};

use crate::context::SerializeContext;
use crate::error::{Error, Result};
use crate::serializer::{base_entity, base_node, EntitySerializer, NodeReference};

pub struct ContentTypeSerializer;

impl EntitySerializer for ContentTypeSerializer {
    fn kind(&self) -> EntityKind {
        EntityKind::ContentType
    }

    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
        let icon = entity.data_str("icon").unwrap_or_default();
        let info = NodeElement::new("Info").child(NodeElement::with_value("Icon", icon));
        let mut node = base_node(entity, ctx)?.child(info);

        let mut properties = NodeElement::new("Properties");
        if let Some(Value::Array(list)) = entity.data.get("properties") {
            // Warm the cache with one partitioned batch lookup instead of
            // one store round-trip per property.
            let ids: Vec<i64> = list
                .iter()
                .filter_map(|p| p.get("data_type").and_then(Value::as_i64))
                .collect();
            ctx.cache.get_all(ctx.store, &ids)?;

            for property in list {
                let Some(alias) = property.get("alias").and_then(Value::as_str) else {
                    continue;
                };
                let Some(data_type) = property.get("data_type").and_then(Value::as_i64) else {
                    continue;
                };
                let referenced = ctx.cache.get(ctx.store, data_type)?.ok_or(
                    Error::DanglingReference {
                        kind: EntityKind::DataType,
                        id: data_type,
                    },
                )?;
                let path = entity_path(ctx.store, ctx.cache, &referenced)?;
                properties = properties.child(
                    NodeElement::new("Property")
                        .attr("alias", alias)
                        .child(NodeElement::with_value("Type", path)),
                );
            }
        }
        node = node.child(properties);

        let mut compositions: Vec<String> = Vec::new();
        if let Some(Value::Array(ids)) = entity.data.get("compositions") {
            for id in ids.iter().filter_map(Value::as_i64) {
                let referenced =
                    ctx.cache
                        .get(ctx.store, id)?
                        .ok_or(Error::DanglingReference {
                            kind: EntityKind::ContentType,
                            id,
                        })?;
                compositions.push(entity_path(ctx.store, ctx.cache, &referenced)?);
            }
        }
        compositions.sort();
        node = node.child(NodeElement::with_value(
            "Compositions",
            serde_json::to_string(&compositions)?,
        ));

        Ok(node)
    }

    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity> {
        let mut entity = base_entity(node, EntityKind::ContentType, ctx)?;

        let icon = node
            .find("Info")
            .and_then(|i| i.find_value("Icon"))
            .unwrap_or_default();
        entity.set_data("icon", json!(icon));

        let mut properties = Vec::new();
        if let Some(container) = node.find("Properties") {
            for property in &container.children {
                let alias = property
                    .attribute("alias")
                    .ok_or_else(|| Error::missing_field(&node.name, "Property/alias"))?;
                let path = property
                    .find_value("Type")
                    .ok_or_else(|| Error::missing_field(&node.name, "Property/Type"))?;
                let referenced = resolve_path(ctx.store, ctx.cache, EntityKind::DataType, path)?
                    .ok_or_else(|| Error::unresolved(EntityKind::DataType, path))?;
                properties.push(json!({"alias": alias, "data_type": referenced.id}));
            }
        }
        entity.set_data("properties", Value::Array(properties));

        let mut compositions = Vec::new();
        if let Some(text) = node.find_value("Compositions") {
            let paths: Vec<String> = serde_json::from_str(text)?;
            for path in paths {
                let referenced =
                    resolve_path(ctx.store, ctx.cache, EntityKind::ContentType, &path)?
                        .ok_or_else(|| Error::unresolved(EntityKind::ContentType, path))?;
                compositions.push(json!(referenced.id));
            }
        }
        entity.set_data("compositions", Value::Array(compositions));

        Ok(entity)
    }

    fn dependencies(&self, node: &PortableNode) -> Vec<NodeReference> {
        let mut references = crate::serializer::parent_reference(node, EntityKind::ContentType);
        if let Some(text) = node.find_value("Compositions") {
            if let Ok(paths) = serde_json::from_str::<Vec<String>>(text) {
                for path in paths {
                    references.push(NodeReference::new(EntityKind::ContentType, path));
                }
            }
        }
        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sync_store::{EntityCache, EntityStore, MemoryStore};

    fn fixture() -> (MemoryStore, Entity) {
        let store = MemoryStore::new();
        let textbox = store
            .save(Entity::new(EntityKind::DataType, "TextBox"))
            .unwrap();
        let base = store
            .save(Entity::new(EntityKind::ContentType, "Base"))
            .unwrap();
        let article = store
            .save(
                Entity::new(EntityKind::ContentType, "Article")
                    .with_data("icon", json!("icon-book"))
                    .with_data(
                        "properties",
                        json!([{"alias": "title", "data_type": textbox.id}]),
                    )
                    .with_data("compositions", json!([base.id])),
            )
            .unwrap();
        (store, article)
    }

    #[test]
    fn test_round_trip_rewrites_references() {
        let (store, article) = fixture();
        let cache = EntityCache::new();
        let ctx = SerializeContext::new(&store, &cache);

        let serializer = ContentTypeSerializer;
        let node = serializer.serialize(&article, &ctx).unwrap();

        let property = &node.find("Properties").unwrap().children[0];
        assert_eq!(property.find_value("Type"), Some("/TextBox"));
        assert_eq!(node.find_value("Compositions"), Some(r#"["/Base"]"#));

        let back = serializer.deserialize(&node, &ctx).unwrap();
        assert_eq!(back.data.get("properties"), article.data.get("properties"));
        assert_eq!(back.data.get("compositions"), article.data.get("compositions"));

        let node_again = serializer.serialize(&back, &ctx).unwrap();
        assert_eq!(node.to_text().unwrap(), node_again.to_text().unwrap());
    }

    #[test]
    fn test_compositions_are_dependencies() {
        let (store, article) = fixture();
        let cache = EntityCache::new();
        let ctx = SerializeContext::new(&store, &cache);

        let node = ContentTypeSerializer.serialize(&article, &ctx).unwrap();
        let deps = ContentTypeSerializer.dependencies(&node);
        assert!(deps.contains(&NodeReference::new(EntityKind::ContentType, "/Base")));
    }

    #[test]
    fn test_missing_data_type_defers() {
        let store = MemoryStore::new();
        let cache = EntityCache::new();
        let ctx = SerializeContext::new(&store, &cache);

        let node = PortableNode::new("ContentType", uuid::Uuid::new_v4())
            .attr("alias", "Article")
            .child(
                NodeElement::new("Properties").child(
                    NodeElement::new("Property")
                        .attr("alias", "title")
                        .child(NodeElement::with_value("Type", "/Missing")),
                ),
            );

        let err = ContentTypeSerializer.deserialize(&node, &ctx).unwrap_err();
        assert!(err.is_deferrable());
    }
}
