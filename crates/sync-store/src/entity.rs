//! The live entity record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::kind::EntityKind;

/// One typed, hierarchical entity as held by the live store.
///
/// `id` is store-local (0 for an entity that has never been saved); `key`
/// is the stable identifier that survives transfer between environments.
/// Kind-specific payload lives in `data` under conventional keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub key: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub kind: EntityKind,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Entity {
    /// Create an unsaved entity with a fresh key.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            key: Uuid::new_v4(),
            name: name.into(),
            parent_id: None,
            kind,
            disabled: false,
            data: Map::new(),
        }
    }

    pub fn with_key(mut self, key: Uuid) -> Self {
        self.key = key;
        self
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// True for an entity that has never been saved to a store.
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    /// String payload value under a conventional key.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Integer payload value under a conventional key.
    pub fn data_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }
}
