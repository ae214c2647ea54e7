//! In-memory store with JSON snapshot persistence

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::kind::EntityKind;
use crate::store::EntityStore;

#[derive(Default)]
struct Inner {
    entities: BTreeMap<i64, Entity>,
    next_id: i64,
    lookups: usize,
    saves: usize,
}

/// An [`EntityStore`] held entirely in memory.
///
/// Backs the CLI's snapshot mode and every test that needs a live store.
/// Lookups are counted so tests can assert cache behaviour.
#[derive(Default)]
pub struct MemoryStore {
    inner: RefCell<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing entities, preserving their ids.
    pub fn with_entities(entities: Vec<Entity>) -> Result<Self> {
        let store = Self::new();
        {
            let mut inner = store.inner.borrow_mut();
            for entity in entities {
                if let Some(existing) =
                    inner.entities.values().find(|e| e.key == entity.key)
                {
                    return Err(Error::DuplicateKey {
                        key: entity.key,
                        existing: existing.id,
                        incoming: entity.id,
                    });
                }
                inner.next_id = inner.next_id.max(entity.id);
                inner.entities.insert(entity.id, entity);
            }
        }
        Ok(store)
    }

    /// Load a snapshot written by [`MemoryStore::save_snapshot`].
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let entities: Vec<Entity> = serde_json::from_str(&text)?;
        Self::with_entities(entities)
    }

    /// Persist all entities as a JSON snapshot.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let inner = self.inner.borrow();
        let entities: Vec<&Entity> = inner.entities.values().collect();
        let text = serde_json::to_string_pretty(&entities)?;
        fs::write(path, text).map_err(|e| Error::io(path, e))
    }

    /// All entities, ordered by id.
    pub fn entities(&self) -> Vec<Entity> {
        self.inner.borrow().entities.values().cloned().collect()
    }

    /// Number of id/key lookups served so far.
    pub fn lookups(&self) -> usize {
        self.inner.borrow().lookups
    }

    /// Number of writes accepted so far.
    pub fn saves(&self) -> usize {
        self.inner.borrow().saves
    }
}

impl EntityStore for MemoryStore {
    fn get_by_id(&self, id: i64) -> Result<Option<Entity>> {
        let mut inner = self.inner.borrow_mut();
        inner.lookups += 1;
        Ok(inner.entities.get(&id).cloned())
    }

    fn get_by_key(&self, key: Uuid) -> Result<Option<Entity>> {
        let mut inner = self.inner.borrow_mut();
        inner.lookups += 1;
        Ok(inner.entities.values().find(|e| e.key == key).cloned())
    }

    fn get_children(&self, parent_id: Option<i64>, kind: EntityKind) -> Result<Vec<Entity>> {
        let inner = self.inner.borrow();
        let mut children: Vec<Entity> = inner
            .entities
            .values()
            .filter(|e| e.kind == kind && e.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    fn save(&self, mut entity: Entity) -> Result<Entity> {
        let mut inner = self.inner.borrow_mut();

        if entity.is_new() {
            if let Some(existing) = inner.entities.values().find(|e| e.key == entity.key) {
                return Err(Error::DuplicateKey {
                    key: entity.key,
                    existing: existing.id,
                    incoming: 0,
                });
            }
            inner.next_id += 1;
            entity.id = inner.next_id;
        } else if !inner.entities.contains_key(&entity.id) {
            return Err(Error::NotFound(entity.id));
        }

        inner.saves += 1;
        inner.entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    fn delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner
            .entities
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_assigns_ids() {
        let store = MemoryStore::new();
        let saved = store
            .save(Entity::new(EntityKind::Language, "English"))
            .unwrap();
        assert_eq!(saved.id, 1);
        let again = store
            .save(Entity::new(EntityKind::Language, "French"))
            .unwrap();
        assert_eq!(again.id, 2);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let store = MemoryStore::new();
        let first = store
            .save(Entity::new(EntityKind::Language, "English"))
            .unwrap();
        let clash = Entity::new(EntityKind::Language, "Other").with_key(first.key);
        assert!(matches!(store.save(clash), Err(Error::DuplicateKey { .. })));
    }

    #[test]
    fn test_children_sorted_by_name() {
        let store = MemoryStore::new();
        store
            .save(Entity::new(EntityKind::Content, "Zeta"))
            .unwrap();
        store
            .save(Entity::new(EntityKind::Content, "Alpha"))
            .unwrap();

        let roots = store.get_children(None, EntityKind::Content).unwrap();
        let names: Vec<_> = roots.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_delete_missing_is_error() {
        let store = MemoryStore::new();
        assert!(matches!(store.delete(99), Err(Error::NotFound(99))));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::new();
        store
            .save(Entity::new(EntityKind::Language, "English"))
            .unwrap();
        store.save_snapshot(&path).unwrap();

        let loaded = MemoryStore::load_snapshot(&path).unwrap();
        assert_eq!(loaded.entities(), store.entities());
    }
}
