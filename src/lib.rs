//! Schema-driven type derivation and content-graph normalization for
//! Prismic repositories.
//!
//! ```text
//! schemas ──► schema::derive_schema_set ──► SDL + TypePathIndex ──┐
//!                                                                 ▼
//! documents ──► source ──► normalize::Normalizer ──► graph::EntityStore
//!                                                                 │
//! preview location ──► preview::PreviewSession ──► merge_preview_data
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod graph;
pub mod hooks;
pub mod logger;
pub mod normalize;
pub mod preview;
pub mod render;
pub mod schema;
pub mod source;
pub mod type_paths;
