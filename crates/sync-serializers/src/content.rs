//! Content serializer
//!
//! Content nodes carry their content-type alias and per-language property
//! values (a two-level keyed collection: property alias, then language).
//! The parent path places the node in the content tree.

use serde_json::{json, Map, Value};
use sync_node::{NodeElement, PortableNode};
use sync_store::{Entity, EntityKind};

use crate::context::SerializeContext;
use crate::error::{Error, Result};
use crate::serializer::{base_entity, base_node, EntitySerializer};

pub struct ContentSerializer;

impl EntitySerializer for ContentSerializer {
    fn kind(&self) -> EntityKind {
        EntityKind::Content
    }

    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
        let content_type = entity.data_str("content_type").unwrap_or_default();
        let info = NodeElement::new("Info")
            .child(NodeElement::with_value("ContentType", content_type));
        let mut node = base_node(entity, ctx)?.child(info);

        let mut properties = NodeElement::new("Properties");
        if let Some(Value::Object(map)) = entity.data.get("properties") {
            for (alias, values) in map {
                let mut property = NodeElement::new("Property").attr("alias", alias);
                if let Value::Object(by_lang) = values {
                    for (lang, text) in by_lang {
                        if let Some(text) = text.as_str() {
                            property = property
                                .child(NodeElement::with_value("Value", text).attr("lang", lang));
                        }
                    }
                }
                properties = properties.child(property);
            }
        }
        node = node.child(properties);

        Ok(node)
    }

    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity> {
        let mut entity = base_entity(node, EntityKind::Content, ctx)?;

        let alias = node
            .find("Info")
            .and_then(|i| i.find_value("ContentType"))
            .ok_or_else(|| Error::missing_field(&node.name, "Info/ContentType"))?;

        // The content type must already exist; the definition cache keeps
        // repeated alias lookups cheap across one run.
        if ctx
            .cache
            .definition(ctx.store, EntityKind::ContentType, alias)?
            .is_none()
        {
            return Err(Error::unresolved(EntityKind::ContentType, format!("/{alias}")));
        }
        entity.set_data("content_type", json!(alias));

        let mut map = Map::new();
        if let Some(container) = node.find("Properties") {
            for property in &container.children {
                let Some(alias) = property.attribute("alias") else {
                    continue;
                };
                let mut by_lang = Map::new();
                for value in &property.children {
                    if let (Some(lang), Some(text)) =
                        (value.attribute("lang"), value.value.as_deref())
                    {
                        by_lang.insert(lang.to_string(), json!(text));
                    }
                }
                map.insert(alias.to_string(), Value::Object(by_lang));
            }
        }
        entity.set_data("properties", Value::Object(map));

        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_store::{EntityCache, EntityStore, MemoryStore};

    fn fixture() -> (MemoryStore, Entity) {
        let store = MemoryStore::new();
        store
            .save(Entity::new(EntityKind::ContentType, "Article"))
            .unwrap();
        let home = store
            .save(
                Entity::new(EntityKind::Content, "Home")
                    .with_data("content_type", json!("Article")),
            )
            .unwrap();
        let post = store
            .save(
                Entity::new(EntityKind::Content, "Post")
                    .with_parent(home.id)
                    .with_data("content_type", json!("Article"))
                    .with_data(
                        "properties",
                        json!({"title": {"en": "Hello", "fr": "Bonjour"}}),
                    ),
            )
            .unwrap();
        (store, post)
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let (store, post) = fixture();
        let cache = EntityCache::new();
        let ctx = SerializeContext::new(&store, &cache);

        let serializer = ContentSerializer;
        let node = serializer.serialize(&post, &ctx).unwrap();
        assert_eq!(node.parent.as_deref(), Some("/Home"));

        let back = serializer.deserialize(&node, &ctx).unwrap();
        assert_eq!(back.parent_id, post.parent_id);
        assert_eq!(back.data.get("properties"), post.data.get("properties"));
        assert_eq!(back.data_str("content_type"), Some("Article"));

        let node_again = serializer.serialize(&back, &ctx).unwrap();
        assert_eq!(node.to_text().unwrap(), node_again.to_text().unwrap());
    }

    #[test]
    fn test_missing_content_type_defers() {
        let store = MemoryStore::new();
        let cache = EntityCache::new();
        let ctx = SerializeContext::new(&store, &cache);

        let node = PortableNode::new("Content", uuid::Uuid::new_v4())
            .attr("alias", "Post")
            .child(NodeElement::new("Info").child(NodeElement::with_value("ContentType", "Gone")));

        let err = ContentSerializer.deserialize(&node, &ctx).unwrap_err();
        assert!(err.is_deferrable());
    }
}
