//! Document normalization.
//!
//! Walks a raw document guided only by a [`TypePathIndex`]. Each field's
//! structural path is looked up in the index and the descriptor variant
//! decides the field normalizer:
//!
//! | Descriptor  | Result                                              |
//! |-------------|-----------------------------------------------------|
//! | `RichText`  | `{ html, text, raw }`                               |
//! | `Link`      | link + `{ url, document: node id, raw }`            |
//! | `Image`     | base and thumbnails with `localFile`                |
//! | `Group`     | each element normalized at `path`                   |
//! | `Slices`    | list of slice entity ids                            |
//! | otherwise   | raw value, unchanged                                |
//!
//! A path missing from the index yields the raw value unchanged, so
//! documents stay readable with an index captured before a schema change.
//!
//! Sibling fields and list elements are normalized concurrently.

mod image;
mod link;
mod rich_text;
mod slices;

pub use image::IMAGE_BASE_KEYS;
pub use link::is_broken;

use std::{fmt, sync::Arc};

use futures::future::{BoxFuture, FutureExt, try_join_all};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    graph::{Entity, EntityStore, NodeIdFactory},
    hooks::{FieldScope, Hooks},
    schema::naming::pascal_case,
    source::{DocumentSource, QueryOptions, SourceError},
    type_paths::{TypeDescriptor, TypePathIndex, extend_path},
};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("document is missing `{0}`")]
    MissingKey(&'static str),

    #[error("failed to fetch linked document")]
    Source(#[from] SourceError),

    #[error("failed to serialize document data")]
    Json(#[from] serde_json::Error),
}

/// Where the normalized graph is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Ahead-of-time build; images may be materialized.
    Build,
    /// Live preview; images are never materialized.
    Preview,
}

impl NormalizeMode {
    pub const fn materializes_assets(self) -> bool {
        matches!(self, Self::Build)
    }
}

/// How document links are treated.
#[derive(Clone)]
pub enum LinkMode {
    /// Store the linked node id; the build creates every document anyway.
    Reference,
    /// Fetch and normalize linked documents missing from the store.
    Fetch {
        source: Arc<dyn DocumentSource>,
        options: QueryOptions,
    },
}

impl fmt::Debug for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => f.write_str("Reference"),
            Self::Fetch { options, .. } => f.debug_struct("Fetch").field("options", options).finish_non_exhaustive(),
        }
    }
}

/// The raw document being normalized.
pub(crate) struct DocContext<'a> {
    pub doc: &'a Value,
    pub node_id: &'a str,
    pub custom_type: &'a str,
    pub doc_id: &'a str,
}

/// One normalization session.
///
/// Cheap to clone; every clone shares the index, store and hooks.
#[derive(Clone)]
pub struct Normalizer {
    type_paths: Arc<TypePathIndex>,
    store: Arc<dyn EntityStore>,
    ids: NodeIdFactory,
    hooks: Hooks,
    mode: NormalizeMode,
    links: LinkMode,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("type_paths", &self.type_paths.len())
            .field("mode", &self.mode)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl Normalizer {
    /// Build-time session: links are references, images may be materialized.
    pub fn build(
        type_paths: Arc<TypePathIndex>,
        store: Arc<dyn EntityStore>,
        ids: NodeIdFactory,
        hooks: Hooks,
    ) -> Self {
        Self {
            type_paths,
            store,
            ids,
            hooks,
            mode: NormalizeMode::Build,
            links: LinkMode::Reference,
        }
    }

    /// Preview session: linked documents are fetched from `source`.
    pub fn preview(
        type_paths: Arc<TypePathIndex>,
        store: Arc<dyn EntityStore>,
        ids: NodeIdFactory,
        hooks: Hooks,
        source: Arc<dyn DocumentSource>,
        options: QueryOptions,
    ) -> Self {
        Self {
            type_paths,
            store,
            ids,
            hooks,
            mode: NormalizeMode::Preview,
            links: LinkMode::Fetch { source, options },
        }
    }

    pub fn type_paths(&self) -> &TypePathIndex {
        &self.type_paths
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn ids(&self) -> &NodeIdFactory {
        &self.ids
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn mode(&self) -> NormalizeMode {
        self.mode
    }

    pub fn link_mode(&self) -> &LinkMode {
        &self.links
    }

    /// Normalize a raw document and create its entity.
    ///
    /// Returns the document's node id. Slice entities, linked documents
    /// (when fetching) and file entities are created along the way.
    pub async fn document_to_entities(&self, doc: &Value) -> Result<String, NormalizeError> {
        let custom_type = doc
            .get("type")
            .and_then(Value::as_str)
            .ok_or(NormalizeError::MissingKey("type"))?;
        let doc_id = doc
            .get("id")
            .and_then(Value::as_str)
            .ok_or(NormalizeError::MissingKey("id"))?;
        let node_id = self.ids.document_id(custom_type, doc_id);

        let ctx = DocContext {
            doc,
            node_id: &node_id,
            custom_type,
            doc_id,
        };
        let raw_data = doc
            .get("data")
            .filter(|data| !data.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let data_path = [custom_type.to_owned(), "data".to_owned()];
        let data = self.normalize_object(&raw_data, &data_path, &ctx).await?;

        let url = self
            .hooks
            .link_resolver
            .resolve(&FieldScope::document(doc), doc);

        let mut fields = doc.as_object().cloned().unwrap_or_default();
        fields.insert("prismicId".to_owned(), Value::String(doc_id.to_owned()));
        fields.insert("data".to_owned(), data);
        fields.insert("dataString".to_owned(), Value::String(serde_json::to_string(&raw_data)?));
        fields.insert("dataRaw".to_owned(), raw_data);
        fields.insert("url".to_owned(), url.map_or(Value::Null, Value::String));

        let type_name = match self.type_paths.get(&data_path[..1]) {
            Some(TypeDescriptor::Object(name)) => name.clone(),
            _ => pascal_case(&["Prismic", custom_type]),
        };
        self.store
            .create_entity(Entity::new(&node_id, type_name, fields, doc));
        Ok(node_id)
    }

    /// Normalize every field of `object`, whose own path is `depth`.
    pub(crate) fn normalize_object<'a>(
        &'a self,
        object: &'a Value,
        depth: &'a [String],
        ctx: &'a DocContext<'a>,
    ) -> BoxFuture<'a, Result<Value, NormalizeError>> {
        async move {
            let Some(fields) = object.as_object() else {
                return Ok(object.clone());
            };
            let normalized = try_join_all(fields.iter().map(|(key, value)| async move {
                let value = self.normalize_field(key, value, depth, ctx).await?;
                Ok::<_, NormalizeError>((key.clone(), value))
            }))
            .await?;
            Ok(Value::Object(normalized.into_iter().collect()))
        }
        .boxed()
    }

    /// Normalize each element of a repeatable list at `path`.
    pub(crate) async fn normalize_list(
        &self,
        list: &Value,
        path: &[String],
        ctx: &DocContext<'_>,
    ) -> Result<Value, NormalizeError> {
        let Some(elements) = list.as_array() else {
            return Ok(list.clone());
        };
        let normalized = try_join_all(
            elements
                .iter()
                .map(|element| self.normalize_object(element, path, ctx)),
        )
        .await?;
        Ok(Value::Array(normalized))
    }

    fn normalize_field<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
        depth: &'a [String],
        ctx: &'a DocContext<'a>,
    ) -> BoxFuture<'a, Result<Value, NormalizeError>> {
        async move {
            if value.is_null() {
                return Ok(Value::Null);
            }
            let path = extend_path(depth, &[key]);
            match self.type_paths.get(&path) {
                Some(TypeDescriptor::RichText) => Ok(rich_text::normalize(self, key, value, ctx)),
                Some(TypeDescriptor::Link) => link::normalize(self, key, value, ctx).await,
                Some(TypeDescriptor::Image) => Ok(image::normalize(self, key, value, ctx).await),
                Some(TypeDescriptor::Group(_)) => self.normalize_list(value, &path, ctx).await,
                Some(TypeDescriptor::Slices(_)) => slices::normalize(self, key, value, depth, ctx).await,
                Some(TypeDescriptor::Scalar(_) | TypeDescriptor::Object(_)) | None => Ok(value.clone()),
            }
        }
        .boxed()
    }
}
