//! Shared context for serializer operations

use sync_store::{EntityCache, EntityStore};

/// Borrowed view of the live store and the run cache.
///
/// Serializers resolve reference paths through the cache so repeated
/// lookups within one run hit the store only once.
pub struct SerializeContext<'a> {
    pub store: &'a dyn EntityStore,
    pub cache: &'a EntityCache,
}

impl<'a> SerializeContext<'a> {
    pub fn new(store: &'a dyn EntityStore, cache: &'a EntityCache) -> Self {
        Self { store, cache }
    }
}
