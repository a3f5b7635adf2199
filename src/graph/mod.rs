//! Content graph: entities, deterministic ids and the entity store.
//!
//! ```text
//! NodeIdFactory ──► id ──► Entity ──► EntityStore (arena: id → entity)
//!                                          ▲
//!                    LazyDocument ─────────┘  (links hold ids only)
//! ```

mod entity;
mod ids;
mod lazy;
mod store;

pub use entity::{Entity, Internal, content_digest};
pub use ids::{GENERATOR_NAME, NodeIdFactory, NodeKey};
pub use lazy::LazyDocument;
pub use store::{EntityStore, MemoryStore};
