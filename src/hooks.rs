//! Per-field capabilities injected into normalization.
//!
//! Every hook receives a [`FieldScope`] naming the field being processed,
//! its raw value and the owning raw document, so one field may render or
//! resolve differently from another.

use std::{collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use rustc_hash::FxHashSet;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::{
    config::SourceConfig,
    graph::{Entity, EntityStore, NodeIdFactory, NodeKey},
    log,
    render::Element,
};

/// What a hook is invoked for.
#[derive(Debug, Clone, Copy)]
pub struct FieldScope<'a> {
    /// Field key. `None` when resolving the document itself.
    pub key: Option<&'a str>,
    /// Raw field value.
    pub value: Option<&'a Value>,
    /// Owning raw document.
    pub node: &'a Value,
}

impl<'a> FieldScope<'a> {
    pub fn field(key: &'a str, value: &'a Value, node: &'a Value) -> Self {
        Self {
            key: Some(key),
            value: Some(value),
            node,
        }
    }

    pub fn document(node: &'a Value) -> Self {
        Self {
            key: None,
            value: None,
            node,
        }
    }
}

/// Computes the URL of a document or document link.
pub trait LinkResolver: Send + Sync {
    /// `target` is a raw document or a document link value; both carry
    /// `type`, `id`, `uid` and `lang`.
    fn resolve(&self, scope: &FieldScope<'_>, target: &Value) -> Option<String>;
}

/// Overrides rich-text rendering per element.
pub trait HtmlSerializer: Send + Sync {
    /// Return `None` to keep the standard markup.
    fn serialize(&self, scope: &FieldScope<'_>, element: &Element<'_>, children: &str) -> Option<String>;
}

/// Decides whether an image is materialized as a local file.
pub trait AssetPolicy: Send + Sync {
    fn should_materialize(&self, scope: &FieldScope<'_>) -> bool;
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unsupported asset URL `{0}`")]
    UnsupportedUrl(String),

    #[error("asset `{url}` could not be materialized: {reason}")]
    Unavailable { url: String, reason: String },
}

/// Turns a remote asset into a locally addressable file entity.
#[async_trait]
pub trait AssetMaterializer: Send + Sync {
    /// Returns the id of the file entity.
    async fn materialize(&self, url: &str, parent_id: &str) -> Result<String, AssetError>;
}

/// Bundle of hooks shared by a normalization session.
#[derive(Clone)]
pub struct Hooks {
    pub link_resolver: Arc<dyn LinkResolver>,
    pub html_serializer: Arc<dyn HtmlSerializer>,
    pub asset_policy: Arc<dyn AssetPolicy>,
    pub materializer: Option<Arc<dyn AssetMaterializer>>,
    /// Page path of a previewed document; falls back to `link_resolver`.
    pub path_resolver: Option<Arc<dyn LinkResolver>>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("materializer", &self.materializer.is_some())
            .field("path_resolver", &self.path_resolver.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            link_resolver: Arc::new(RouteLinkResolver::default()),
            html_serializer: Arc::new(NoHtmlSerializer),
            asset_policy: Arc::new(ImagePolicy::default()),
            materializer: None,
            path_resolver: None,
        }
    }
}

impl Hooks {
    /// Hooks described by `[links]` and `[images]`.
    ///
    /// Image materialization records file entities in `store`.
    pub fn from_config(
        config: &SourceConfig,
        store: Arc<dyn EntityStore>,
        ids: NodeIdFactory,
    ) -> Self {
        Self {
            materializer: Some(Arc::new(RemoteFileRegistry::new(store, ids))),
            ..Self::for_preview(config)
        }
    }

    /// Same routes and policy, no materializer.
    pub fn for_preview(config: &SourceConfig) -> Self {
        let mut preview_routes = config.links.routes.clone();
        preview_routes.extend(config.links.preview_routes.clone());

        Self {
            link_resolver: Arc::new(RouteLinkResolver::new(config.links.routes.clone())),
            html_serializer: Arc::new(NoHtmlSerializer),
            asset_policy: Arc::new(ImagePolicy::new(
                config.images.normalize,
                config.images.skip_fields.iter().cloned(),
            )),
            materializer: None,
            path_resolver: Some(Arc::new(RouteLinkResolver::new(preview_routes))),
        }
    }

    pub fn path_resolver(&self) -> &dyn LinkResolver {
        self.path_resolver.as_deref().unwrap_or(&*self.link_resolver)
    }
}

// ============================================================================
// Provided implementations
// ============================================================================

/// Expands a route pattern per custom type.
///
/// Placeholders: `:uid`, `:id`, `:lang`, `:type`. A route whose placeholder
/// has no value in the target resolves to `None`.
#[derive(Debug, Clone, Default)]
pub struct RouteLinkResolver {
    routes: BTreeMap<String, String>,
}

impl RouteLinkResolver {
    pub fn new(routes: BTreeMap<String, String>) -> Self {
        Self { routes }
    }

    fn expand(pattern: &str, target: &Value) -> Option<String> {
        let mut out = String::with_capacity(pattern.len());
        for (idx, segment) in pattern.split('/').enumerate() {
            if idx > 0 {
                out.push('/');
            }
            match segment.strip_prefix(':') {
                Some(key @ ("uid" | "id" | "lang" | "type")) => {
                    let value = target.get(key).and_then(Value::as_str)?;
                    out.push_str(&urlencoding::encode(value));
                }
                _ => out.push_str(segment),
            }
        }
        Some(out)
    }
}

impl LinkResolver for RouteLinkResolver {
    fn resolve(&self, _scope: &FieldScope<'_>, target: &Value) -> Option<String> {
        let custom_type = target.get("type").and_then(Value::as_str)?;
        let pattern = self.routes.get(custom_type)?;
        Self::expand(pattern, target)
    }
}

/// Keeps the standard markup for every element.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHtmlSerializer;

impl HtmlSerializer for NoHtmlSerializer {
    fn serialize(&self, _: &FieldScope<'_>, _: &Element<'_>, _: &str) -> Option<String> {
        None
    }
}

/// Global switch plus per-field-key exclusions.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    enabled: bool,
    skip_fields: FxHashSet<String>,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_fields: FxHashSet::default(),
        }
    }
}

impl ImagePolicy {
    pub fn new(enabled: bool, skip_fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            enabled,
            skip_fields: skip_fields.into_iter().collect(),
        }
    }
}

impl AssetPolicy for ImagePolicy {
    fn should_materialize(&self, scope: &FieldScope<'_>) -> bool {
        self.enabled && !scope.key.is_some_and(|key| self.skip_fields.contains(key))
    }
}

/// Records one `File` entity per remote URL under the owning document.
///
/// Files are registered, not downloaded; a downstream asset pipeline picks
/// them up from the graph.
pub struct RemoteFileRegistry {
    store: Arc<dyn EntityStore>,
    ids: NodeIdFactory,
}

impl RemoteFileRegistry {
    pub fn new(store: Arc<dyn EntityStore>, ids: NodeIdFactory) -> Self {
        Self { store, ids }
    }
}

/// File name and extension from the last path segment of a URL.
fn file_name(url: &str) -> (String, String) {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    let last = urlencoding::decode(last).map_or_else(|_| last.to_owned(), |s| s.into_owned());
    match last.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() => (name.to_owned(), ext.to_lowercase()),
        _ => (last, String::new()),
    }
}

#[async_trait]
impl AssetMaterializer for RemoteFileRegistry {
    async fn materialize(&self, url: &str, parent_id: &str) -> Result<String, AssetError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AssetError::UnsupportedUrl(url.to_owned()));
        }

        let id = self.ids.node_id(&NodeKey::RemoteFile { url });
        if self.store.has_entity(&id) {
            return Ok(id);
        }

        let (name, extension) = file_name(url);
        let mut fields = Map::new();
        fields.insert("url".into(), url.into());
        fields.insert("parent".into(), parent_id.into());
        fields.insert("name".into(), name.into());
        fields.insert("ext".into(), extension.into());
        self.store
            .create_entity(Entity::new(&id, "File", fields, &json!({ "url": url })));
        log!("images"; "registered {url}");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryStore;

    fn routes() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("page".to_owned(), "/:uid".to_owned()),
            ("blog_post".to_owned(), "/:lang/blog/:uid".to_owned()),
        ])
    }

    #[test]
    fn test_route_link_resolver() {
        let resolver = RouteLinkResolver::new(routes());
        let doc = json!({ "type": "blog_post", "id": "X1", "uid": "hello world", "lang": "en-us" });
        let scope = FieldScope::document(&doc);

        assert_eq!(resolver.resolve(&scope, &doc).as_deref(), Some("/en-us/blog/hello%20world"));
        assert_eq!(resolver.resolve(&scope, &json!({ "type": "page" })), None);
        assert_eq!(resolver.resolve(&scope, &json!({ "type": "author", "uid": "a" })), None);
    }

    #[test]
    fn test_image_policy() {
        let policy = ImagePolicy::new(true, ["og_image".to_owned()]);
        let doc = json!({});
        let value = json!({});
        assert!(policy.should_materialize(&FieldScope::field("hero", &value, &doc)));
        assert!(!policy.should_materialize(&FieldScope::field("og_image", &value, &doc)));
        assert!(!ImagePolicy::new(false, []).should_materialize(&FieldScope::field("hero", &value, &doc)));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("https://cdn/x/a%20b.PNG?auto=compress"), ("a b".into(), "png".into()));
        assert_eq!(file_name("https://cdn/x/noext"), ("noext".into(), String::new()));
    }

    #[tokio::test]
    async fn test_remote_file_registry() {
        let store = Arc::new(MemoryStore::new());
        let registry = RemoteFileRegistry::new(store.clone(), NodeIdFactory::default());

        let id = registry.materialize("https://images.prismic.io/a.jpg", "doc-1").await.unwrap();
        let again = registry.materialize("https://images.prismic.io/a.jpg", "doc-2").await.unwrap();
        assert_eq!(id, again);

        let file = store.get_entity(&id).unwrap();
        assert_eq!(file.type_name(), "File");
        assert_eq!(file.get("parent"), Some(&json!("doc-1")));
        assert_eq!(file.get("ext"), Some(&json!("jpg")));

        let err = registry.materialize("data:image/png;base64,AA", "doc-1").await;
        assert!(matches!(err, Err(AssetError::UnsupportedUrl(_))));
    }

    #[test]
    fn test_path_resolver_falls_back() {
        let hooks = Hooks::default();
        let doc = json!({ "type": "page", "uid": "a" });
        assert_eq!(hooks.path_resolver().resolve(&FieldScope::document(&doc), &doc), None);
    }
}
