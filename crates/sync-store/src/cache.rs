//! Run-scoped entity resolution cache

use std::cell::RefCell;
use std::collections::HashMap;

use uuid::Uuid;

use crate::entity::Entity;
use crate::error::Result;
use crate::kind::EntityKind;
use crate::store::{walk, EntityStore};

/// Read-through cache over the live store's lookup operations.
///
/// Memoizes id and key lookups, entity names, and type definitions for the
/// duration of ONE run. Not thread-safe — processing within a run is
/// sequential. Must be cleared at the start and end of every bulk
/// operation; a stale entry surviving into a later run is a correctness
/// bug, not a performance detail.
#[derive(Default)]
pub struct EntityCache {
    by_id: RefCell<HashMap<i64, Entity>>,
    id_by_key: RefCell<HashMap<Uuid, i64>>,
    names: RefCell<HashMap<i64, String>>,
    definitions: RefCell<HashMap<(EntityKind, String), Entity>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entity by id, fetching from the store on first use.
    pub fn get(&self, store: &dyn EntityStore, id: i64) -> Result<Option<Entity>> {
        if let Some(entity) = self.by_id.borrow().get(&id) {
            return Ok(Some(entity.clone()));
        }

        match store.get_by_id(id)? {
            Some(entity) => {
                self.insert(&entity);
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Entity by stable key, fetching from the store on first use.
    pub fn get_by_key(&self, store: &dyn EntityStore, key: Uuid) -> Result<Option<Entity>> {
        let cached_id = self.id_by_key.borrow().get(&key).copied();
        if let Some(id) = cached_id {
            return self.get(store, id);
        }

        match store.get_by_key(key)? {
            Some(entity) => {
                self.insert(&entity);
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Batch lookup: requested ids are partitioned into cached and
    /// uncached, only the uncached set hits the store, and the results are
    /// merged in request order. Unknown ids are skipped.
    pub fn get_all(&self, store: &dyn EntityStore, ids: &[i64]) -> Result<Vec<Entity>> {
        let mut merged = Vec::with_capacity(ids.len());
        for &id in ids {
            let cached = self.by_id.borrow().get(&id).cloned();
            match cached {
                Some(entity) => merged.push(entity),
                None => {
                    if let Some(entity) = store.get_by_id(id)? {
                        self.insert(&entity);
                        merged.push(entity);
                    }
                }
            }
        }
        Ok(merged)
    }

    /// Display name for an entity id.
    pub fn name(&self, store: &dyn EntityStore, id: i64) -> Result<Option<String>> {
        if let Some(name) = self.names.borrow().get(&id) {
            return Ok(Some(name.clone()));
        }
        Ok(self.get(store, id)?.map(|e| e.name))
    }

    /// Type-definition lookup by name, scanning the store once per
    /// (kind, name) pair. Used to resolve content-type aliases during
    /// content import.
    pub fn definition(
        &self,
        store: &dyn EntityStore,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<Entity>> {
        let cache_key = (kind, name.to_string());
        if let Some(entity) = self.definitions.borrow().get(&cache_key) {
            return Ok(Some(entity.clone()));
        }

        let found = walk(store, kind)?.into_iter().find(|e| e.name == name);
        if let Some(entity) = &found {
            self.insert(entity);
            self.definitions.borrow_mut().insert(cache_key, entity.clone());
        }
        Ok(found)
    }

    /// Populate the cache with a freshly fetched or saved entity.
    pub fn insert(&self, entity: &Entity) {
        self.by_id.borrow_mut().insert(entity.id, entity.clone());
        self.id_by_key.borrow_mut().insert(entity.key, entity.id);
        self.names
            .borrow_mut()
            .insert(entity.id, entity.name.clone());
    }

    /// Drop a single entity from the cache (after a delete).
    pub fn evict(&self, id: i64) {
        if let Some(entity) = self.by_id.borrow_mut().remove(&id) {
            self.id_by_key.borrow_mut().remove(&entity.key);
        }
        self.names.borrow_mut().remove(&id);
        self.definitions.borrow_mut().retain(|_, e| e.id != id);
    }

    /// Drop everything. Called at the start and end of every bulk run.
    pub fn clear(&self) {
        self.by_id.borrow_mut().clear();
        self.id_by_key.borrow_mut().clear();
        self.names.borrow_mut().clear();
        self.definitions.borrow_mut().clear();
    }
}
