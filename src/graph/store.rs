//! Entity store.
//!
//! The store is the only authority on whether an entity exists. Link
//! following relies on [`EntityStore::claim`] being atomic: two concurrent
//! normalizations of the same linked document must never both see it as
//! absent.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::Entity;

pub trait EntityStore: Send + Sync {
    /// Insert or replace an entity. Replaces a claim placeholder.
    fn create_entity(&self, entity: Entity);

    /// `true` for created entities and for outstanding claims.
    fn has_entity(&self, id: &str) -> bool;

    /// Created entities only; a bare claim reads as absent.
    fn get_entity(&self, id: &str) -> Option<Arc<Entity>>;

    /// Register a placeholder for `id` unless anything is registered yet.
    ///
    /// Returns `true` when the caller now owns the id and must create or
    /// release it.
    fn claim(&self, id: &str) -> bool;

    /// Drop an unfinished claim. Created entities are kept.
    fn release(&self, id: &str);
}

#[derive(Debug, Clone)]
enum Slot {
    Claimed,
    Ready(Arc<Entity>),
}

/// In-memory arena keyed by entity id.
///
/// # Thread Safety
///
/// Uses `RwLock` so lookups run concurrently while `claim` performs its
/// check and insert under one write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<FxHashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of created entities.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Created entities sorted by id.
    pub fn entities(&self) -> Vec<Arc<Entity>> {
        let slots = self.slots.read();
        let mut entities: Vec<_> = slots
            .values()
            .filter_map(|slot| match slot {
                Slot::Ready(entity) => Some(Arc::clone(entity)),
                Slot::Claimed => None,
            })
            .collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        entities
    }

    /// The whole graph as `{ id: entity }`.
    pub fn snapshot(&self) -> Value {
        let graph: BTreeMap<String, Value> = self
            .entities()
            .into_iter()
            .map(|entity| (entity.id.clone(), entity.to_value()))
            .collect();
        serde_json::to_value(graph).unwrap_or_default()
    }

    pub fn clear(&self) {
        self.slots.write().clear();
    }
}

impl EntityStore for MemoryStore {
    fn create_entity(&self, entity: Entity) {
        self.slots
            .write()
            .insert(entity.id.clone(), Slot::Ready(Arc::new(entity)));
    }

    fn has_entity(&self, id: &str) -> bool {
        self.slots.read().contains_key(id)
    }

    fn get_entity(&self, id: &str) -> Option<Arc<Entity>> {
        match self.slots.read().get(id) {
            Some(Slot::Ready(entity)) => Some(Arc::clone(entity)),
            _ => None,
        }
    }

    fn claim(&self, id: &str) -> bool {
        let mut slots = self.slots.write();
        if slots.contains_key(id) {
            return false;
        }
        slots.insert(id.to_owned(), Slot::Claimed);
        true
    }

    fn release(&self, id: &str) {
        let mut slots = self.slots.write();
        if matches!(slots.get(id), Some(Slot::Claimed)) {
            slots.remove(id);
        }
    }
}
