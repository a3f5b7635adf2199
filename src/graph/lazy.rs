//! Lazy references between entities.

use std::{fmt, sync::Arc};

use serde::{Serialize, Serializer};

use super::{Entity, EntityStore};

/// A non-owning reference to a document entity.
///
/// Holds only the id. The store is consulted on [`LazyDocument::get`], so
/// cyclic graphs never materialize recursively.
#[derive(Clone)]
pub struct LazyDocument {
    id: String,
    store: Arc<dyn EntityStore>,
}

impl LazyDocument {
    pub fn new(id: impl Into<String>, store: Arc<dyn EntityStore>) -> Self {
        Self {
            id: id.into(),
            store,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dereference. `None` while the target is absent or still being fetched.
    pub fn get(&self) -> Option<Arc<Entity>> {
        self.store.get_entity(&self.id)
    }
}

impl fmt::Debug for LazyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LazyDocument").field(&self.id).finish()
    }
}

impl PartialEq for LazyDocument {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Serializes as the bare id.
impl Serialize for LazyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryStore;
    use serde_json::{Map, json};

    #[test]
    fn test_resolves_on_read() {
        let store = Arc::new(MemoryStore::new());
        let lazy = LazyDocument::new("a", store.clone());
        assert!(lazy.get().is_none());

        store.create_entity(Entity::new("a", "PrismicPage", Map::new(), &json!(null)));
        assert_eq!(lazy.get().unwrap().id, "a");
        assert_eq!(serde_json::to_value(&lazy).unwrap(), json!("a"));
    }
}
