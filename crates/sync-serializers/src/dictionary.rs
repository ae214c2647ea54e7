//! Dictionary serializer
//!
//! Translations are a keyed collection (one entry per language ISO code),
//! stored sorted so output is deterministic regardless of live-store order.

use serde_json::{json, Map, Value};
use sync_node::{NodeElement, PortableNode};
use sync_store::{Entity, EntityKind};

use crate::context::SerializeContext;
use crate::error::Result;
use crate::serializer::{base_entity, base_node, EntitySerializer, NodeReference};

pub struct DictionarySerializer;

impl EntitySerializer for DictionarySerializer {
    fn kind(&self) -> EntityKind {
        EntityKind::Dictionary
    }

    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
        let mut translations = NodeElement::new("Translations");
        if let Some(Value::Object(map)) = entity.data.get("translations") {
            // serde_json maps iterate in key order, so entries come out
            // sorted by language.
            for (lang, text) in map {
                if let Some(text) = text.as_str() {
                    translations = translations
                        .child(NodeElement::with_value("Translation", text).attr("lang", lang));
                }
            }
        }

        Ok(base_node(entity, ctx)?.child(translations))
    }

    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity> {
        let mut entity = base_entity(node, EntityKind::Dictionary, ctx)?;

        let mut map = Map::new();
        if let Some(translations) = node.find("Translations") {
            for entry in &translations.children {
                if let (Some(lang), Some(text)) = (entry.attribute("lang"), entry.value.as_deref())
                {
                    map.insert(lang.to_string(), json!(text));
                }
            }
        }
        entity.set_data("translations", Value::Object(map));

        Ok(entity)
    }

    fn dependencies(&self, node: &PortableNode) -> Vec<NodeReference> {
        let mut references = crate::serializer::parent_reference(node, EntityKind::Dictionary);
        if let Some(translations) = node.find("Translations") {
            for entry in &translations.children {
                if let Some(lang) = entry.attribute("lang") {
                    references.push(NodeReference::new(EntityKind::Language, format!("/{lang}")));
                }
            }
        }
        references
    }
}
