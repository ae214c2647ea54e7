//! Data-type serializer
//!
//! The editor config blob travels as JSON text. An `element_type` entry in
//! the config is a content-type reference: serialized as a portable path,
//! resolved back to a store-local id on import. Content types import after
//! data types, so an unresolved path here is the canonical second-pass
//! case — the reference is NOT declared as an ordering dependency.

use serde_json::{json, Value};
use sync_node::{NodeElement, PortableNode};
use sync_store::{entity_path, resolve_path, Entity, EntityKind};

use crate::context::SerializeContext;
use crate::error::{Error, Result};
use crate::serializer::{base_entity, base_node, EntitySerializer};

const ELEMENT_TYPE: &str = "element_type";

pub struct DataTypeSerializer;

impl EntitySerializer for DataTypeSerializer {
    fn kind(&self) -> EntityKind {
        EntityKind::DataType
    }

    fn serialize(&self, entity: &Entity, ctx: &SerializeContext<'_>) -> Result<PortableNode> {
        let editor = entity.data_str("editor_alias").unwrap_or_default();
        let info = NodeElement::new("Info")
            .child(NodeElement::with_value("EditorAlias", editor));

        let mut node = base_node(entity, ctx)?.child(info);

        if let Some(config) = entity.data.get("config") {
            let mut config = config.clone();
            rewrite_element_type_out(&mut config, ctx)?;
            node = node.child(NodeElement::with_value(
                "Config",
                serde_json::to_string(&config)?,
            ));
        }

        Ok(node)
    }

    fn deserialize(&self, node: &PortableNode, ctx: &SerializeContext<'_>) -> Result<Entity> {
        let mut entity = base_entity(node, EntityKind::DataType, ctx)?;

        let editor = node
            .find("Info")
            .and_then(|i| i.find_value("EditorAlias"))
            .ok_or_else(|| Error::missing_field(&node.name, "Info/EditorAlias"))?;
        entity.set_data("editor_alias", json!(editor));

        match node.find_value("Config") {
            Some(text) => {
                let mut config: Value = serde_json::from_str(text)?;
                rewrite_element_type_in(&mut config, ctx)?;
                entity.set_data("config", config);
            }
            None => {
                entity.data.remove("config");
            }
        }

        Ok(entity)
    }
}

/// id -> portable path
fn rewrite_element_type_out(config: &mut Value, ctx: &SerializeContext<'_>) -> Result<()> {
    let Some(id) = config.get(ELEMENT_TYPE).and_then(Value::as_i64) else {
        return Ok(());
    };

    match ctx.cache.get(ctx.store, id)? {
        Some(referenced) => {
            let path = entity_path(ctx.store, ctx.cache, &referenced)?;
            config[ELEMENT_TYPE] = json!(path);
            Ok(())
        }
        None => Err(Error::DanglingReference {
            kind: EntityKind::ContentType,
            id,
        }),
    }
}

/// portable path -> id; unresolved paths defer the item to the second pass
fn rewrite_element_type_in(config: &mut Value, ctx: &SerializeContext<'_>) -> Result<()> {
    let Some(path) = config
        .get(ELEMENT_TYPE)
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return Ok(());
    };

    match resolve_path(ctx.store, ctx.cache, EntityKind::ContentType, &path)? {
        Some(referenced) => {
            config[ELEMENT_TYPE] = json!(referenced.id);
            Ok(())
        }
        None => Err(Error::unresolved(EntityKind::ContentType, path)),
    }
}
