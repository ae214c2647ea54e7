//! Entity path resolution
//!
//! Portable files refer to other entities by path ("/Site/Blog/Post")
//! rather than store-local id, so references survive transfer between
//! environments. Paths are built by walking the parent chain and resolved
//! by descending the tree through the live-store contract.

use crate::cache::EntityCache;
use crate::entity::Entity;
use crate::error::Result;
use crate::kind::EntityKind;
use crate::store::EntityStore;

/// Build the portable path for an entity by walking its parent chain.
pub fn entity_path(
    store: &dyn EntityStore,
    cache: &EntityCache,
    entity: &Entity,
) -> Result<String> {
    let mut segments = vec![entity.name.clone()];
    let mut parent = entity.parent_id;

    while let Some(id) = parent {
        match cache.get(store, id)? {
            Some(ancestor) => {
                segments.push(ancestor.name.clone());
                parent = ancestor.parent_id;
            }
            None => {
                tracing::warn!(id, "dangling parent reference while building path");
                break;
            }
        }
    }

    segments.reverse();
    Ok(format!("/{}", segments.join("/")))
}

/// Resolve a portable path back to an entity of one kind.
///
/// Descends from the kind's roots one segment at a time; returns `None` as
/// soon as a segment has no match.
pub fn resolve_path(
    store: &dyn EntityStore,
    cache: &EntityCache,
    kind: EntityKind,
    path: &str,
) -> Result<Option<Entity>> {
    let mut current: Option<Entity> = None;

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let parent_id = current.as_ref().map(|e| e.id);
        let children = store.get_children(parent_id, kind)?;
        match children.into_iter().find(|c| c.name == segment) {
            Some(child) => {
                cache.insert(&child);
                current = Some(child);
            }
            None => return Ok(None),
        }
    }

    Ok(current)
}
