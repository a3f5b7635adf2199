//! Live preview of a single draft document.
//!
//! ```text
//! location ──► token + documentId ──► DocumentSource::get_by_id
//!                                          │
//!            TypePathIndex (exported) ──► Normalizer::preview ──► session store
//!                                          │
//!                      { previewData, path, isPreview, shareLink }
//! ```
//!
//! Every run gets a fresh entity store, dropped with the result. Linked
//! documents are fetched on demand; cycles stop at claimed ids.

mod location;
mod merge;

pub use location::PreviewLocation;
pub use merge::{MergeError, merge_preview_data};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    config::SourceConfig,
    graph::{Entity, EntityStore, LazyDocument, MemoryStore, NodeIdFactory},
    hooks::{FieldScope, Hooks},
    log,
    normalize::{NormalizeError, Normalizer, is_broken},
    schema::naming::camel_case,
    source::{DocumentSource, QueryOptions, SourceError},
    type_paths::{TypeDescriptor, TypePathIndex, extend_path},
};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("invalid id namespace")]
    Namespace(#[from] uuid::Error),

    #[error("failed to fetch preview document")]
    Source(#[from] SourceError),

    #[error("failed to normalize preview document")]
    Normalize(#[from] NormalizeError),

    #[error("preview document `{0}` was not created")]
    Missing(String),
}

/// What a preview run hands to the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    /// `{ camelCasedTypeName: document }`; `None` when not a preview.
    pub preview_data: Option<Value>,
    /// Page path of the previewed document.
    pub path: Option<String>,
    pub is_preview: bool,
    pub share_link: String,
}

pub struct PreviewSession {
    repository: String,
    type_paths: Arc<TypePathIndex>,
    hooks: Hooks,
    ids: NodeIdFactory,
    source: Arc<dyn DocumentSource>,
    options: QueryOptions,
}

impl PreviewSession {
    pub fn new(
        repository: impl Into<String>,
        type_paths: Arc<TypePathIndex>,
        hooks: Hooks,
        ids: NodeIdFactory,
        source: Arc<dyn DocumentSource>,
        options: QueryOptions,
    ) -> Self {
        Self {
            repository: repository.into(),
            type_paths,
            hooks,
            ids,
            source,
            options,
        }
    }

    pub fn from_config(
        config: &SourceConfig,
        type_paths: Arc<TypePathIndex>,
        source: Arc<dyn DocumentSource>,
    ) -> Result<Self, PreviewError> {
        Ok(Self::new(
            config.repository.name.clone(),
            type_paths,
            Hooks::for_preview(config),
            NodeIdFactory::new(&config.build.namespace)?,
            source,
            QueryOptions::from_config(&config.repository),
        ))
    }

    /// Fetch, normalize and present the document named by `location`.
    pub async fn run(&self, location: &PreviewLocation) -> Result<PreviewResult, PreviewError> {
        let share_link = location.share_link(&self.repository);
        let (Some(token), Some(document_id)) = (&location.token, &location.document_id) else {
            return Ok(PreviewResult {
                share_link,
                ..PreviewResult::default()
            });
        };

        let options = QueryOptions {
            release_ref: Some(token.clone()),
            ..self.options.clone()
        };
        log!("preview"; "fetching {document_id}");
        let raw = self.source.get_by_id(document_id, &options).await?;
        let custom_type = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or(NormalizeError::MissingKey("type"))?;

        let store = Arc::new(MemoryStore::new());
        let root_id = self.ids.document_id(custom_type, document_id);
        store.claim(&root_id);

        let normalizer = Normalizer::preview(
            self.type_paths.clone(),
            store.clone(),
            self.ids,
            self.hooks.clone(),
            self.source.clone(),
            options,
        );
        let root_id = normalizer.document_to_entities(&raw).await?;
        let root = store
            .get_entity(&root_id)
            .ok_or_else(|| PreviewError::Missing(root_id.clone()))?;
        log!("preview"; "normalized {} with {} entities", root.type_name(), store.len());

        let store: Arc<dyn EntityStore> = store;
        let path = self
            .hooks
            .path_resolver()
            .resolve(&FieldScope::document(&raw), &raw);
        let mut preview_data = Map::new();
        preview_data.insert(camel_case(root.type_name()), self.present(&root, &store));

        Ok(PreviewResult {
            preview_data: Some(Value::Object(preview_data)),
            path,
            is_preview: true,
            share_link,
        })
    }

    /// The entity as pages read it.
    ///
    /// Slice-zone id lists become the slice entities, each tagged with
    /// `__typename`. Link fields get the linked document in place of its
    /// id; the linked document itself is not expanded further.
    pub fn present(&self, entity: &Entity, store: &Arc<dyn EntityStore>) -> Value {
        let mut value = entity.to_value();
        let custom_type = entity.get("type").and_then(Value::as_str).unwrap_or_default();
        if let Some(data) = value.get_mut("data") {
            let path = [custom_type.to_owned(), "data".to_owned()];
            *data = self.present_object(data, &path, store);
        }
        value
    }

    fn present_object(&self, object: &Value, depth: &[String], store: &Arc<dyn EntityStore>) -> Value {
        let Some(fields) = object.as_object() else {
            return object.clone();
        };
        let presented = fields.iter().map(|(key, value)| {
            let path = extend_path(depth, &[key.as_str()]);
            let value = match self.type_paths.get(&path) {
                Some(TypeDescriptor::Slices(_)) => self.present_slices(value, &path, store),
                Some(TypeDescriptor::Link) => present_link(value, store),
                Some(TypeDescriptor::Group(_)) => self.present_list(value, &path, store),
                _ => value.clone(),
            };
            (key.clone(), value)
        });
        Value::Object(presented.collect())
    }

    fn present_list(&self, list: &Value, path: &[String], store: &Arc<dyn EntityStore>) -> Value {
        match list.as_array() {
            Some(items) => items
                .iter()
                .map(|item| self.present_object(item, path, store))
                .collect(),
            None => list.clone(),
        }
    }

    fn present_slices(&self, zone: &Value, path: &[String], store: &Arc<dyn EntityStore>) -> Value {
        let Some(ids) = zone.as_array() else {
            return zone.clone();
        };
        ids.iter()
            .map(|id| {
                let Some(slice) = id.as_str().and_then(|id| store.get_entity(id)) else {
                    return id.clone();
                };
                let mut value = slice.to_value();
                let slice_type = slice.get("slice_type").and_then(Value::as_str).unwrap_or_default();
                if let Some(primary) = value.get_mut("primary") {
                    *primary = self.present_object(primary, &extend_path(path, &[slice_type, "primary"]), store);
                }
                if let Some(items) = value.get_mut("items") {
                    *items = self.present_list(items, &extend_path(path, &[slice_type, "items"]), store);
                }
                if let Value::Object(object) = &mut value {
                    object.insert("__typename".to_owned(), Value::String(slice.type_name().to_owned()));
                }
                value
            })
            .collect()
    }
}

fn present_link(link: &Value, store: &Arc<dyn EntityStore>) -> Value {
    let mut link = link.clone();
    if is_broken(&link) {
        return link;
    }
    let Some(id) = link.get("document").and_then(Value::as_str) else {
        return link;
    };
    if let Some(document) = LazyDocument::new(id, store.clone()).get() {
        link["document"] = document.to_value();
    }
    link
}
