//! The live store contract

use uuid::Uuid;

use crate::entity::Entity;
use crate::error::Result;
use crate::kind::EntityKind;

/// The narrow read/write contract the engine requires from a live store.
///
/// The host application implements this per supported entity kind; the
/// engine never touches storage any other way. Methods take `&self` —
/// implementations carry their own interior mutability, and the engine
/// serializes all writes within a run.
pub trait EntityStore {
    /// Fetch an entity by store-local id.
    fn get_by_id(&self, id: i64) -> Result<Option<Entity>>;

    /// Fetch an entity by stable key.
    fn get_by_key(&self, key: Uuid) -> Result<Option<Entity>>;

    /// Children of a parent (or roots when `parent_id` is `None`) of one
    /// kind, sorted by name.
    fn get_children(&self, parent_id: Option<i64>, kind: EntityKind) -> Result<Vec<Entity>>;

    /// Insert or update an entity, returning the saved record (with an
    /// assigned id for new entities).
    fn save(&self, entity: Entity) -> Result<Entity>;

    /// Remove an entity by id.
    fn delete(&self, id: i64) -> Result<()>;
}

/// Walk every entity of one kind, depth-first from the roots.
///
/// Convenience over the contract's `get_children`; used by export and by
/// path resolution.
pub fn walk(store: &dyn EntityStore, kind: EntityKind) -> Result<Vec<Entity>> {
    let mut result = Vec::new();
    let mut stack: Vec<Entity> = store.get_children(None, kind)?;
    stack.reverse();

    while let Some(entity) = stack.pop() {
        let mut children = store.get_children(Some(entity.id), kind)?;
        children.reverse();
        result.push(entity);
        stack.extend(children);
    }

    Ok(result)
}
