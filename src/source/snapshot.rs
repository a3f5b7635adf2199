//! Document source backed by a JSON export on disk.
//!
//! Accepts either a bare array of documents or an API response envelope
//! (`{ "results": [...] }`).

use std::{fs, path::Path};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use super::{DocumentSource, Page, QueryOptions, SourceError};

#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    documents: Vec<Value>,
    by_id: FxHashMap<String, usize>,
}

impl SnapshotSource {
    pub fn new(documents: Vec<Value>) -> Self {
        let by_id = documents
            .iter()
            .enumerate()
            .filter_map(|(idx, doc)| Some((doc.get("id")?.as_str()?.to_owned(), idx)))
            .collect();
        Self { documents, by_id }
    }

    pub fn from_json(content: &str) -> Result<Self, SourceError> {
        let documents = match serde_json::from_str(content)? {
            Value::Array(documents) => documents,
            Value::Object(mut envelope) => match envelope.remove("results") {
                Some(Value::Array(documents)) => documents,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(Self::new(documents))
    }

    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content =
            fs::read_to_string(path).map_err(|err| SourceError::Io(path.to_path_buf(), err))?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Copy of `doc` with `fetch_links` fields embedded into its document links.
    fn with_links(&self, doc: &Value, options: &QueryOptions) -> Value {
        let mut doc = doc.clone();
        if !options.fetch_links.is_empty() {
            self.embed_links(&mut doc, options);
        }
        doc
    }

    /// Walk `value` and add a `data` object to every document link whose
    /// type has requested fields.
    fn embed_links(&self, value: &mut Value, options: &QueryOptions) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.embed_links(item, options);
                }
            }
            Value::Object(object) => {
                if let Some(data) = self.linked_fields(object, options) {
                    object.insert("data".to_owned(), Value::Object(data));
                    return;
                }
                for child in object.values_mut() {
                    self.embed_links(child, options);
                }
            }
            _ => {}
        }
    }

    fn linked_fields(&self, link: &Map<String, Value>, options: &QueryOptions) -> Option<Map<String, Value>> {
        if link.get("link_type").and_then(Value::as_str) != Some("Document") {
            return None;
        }
        let custom_type = link.get("type")?.as_str()?;
        let id = link.get("id")?.as_str()?;

        let fields: Vec<&str> = options
            .fetch_links
            .iter()
            .filter_map(|spec| spec.split_once('.'))
            .filter(|(ty, _)| *ty == custom_type)
            .map(|(_, field)| field)
            .collect();
        if fields.is_empty() {
            return None;
        }

        let linked = self.documents.get(*self.by_id.get(id)?)?.get("data")?;
        Some(
            fields
                .into_iter()
                .filter_map(|field| Some((field.to_owned(), linked.get(field)?.clone())))
                .collect(),
        )
    }
}

#[async_trait]
impl DocumentSource for SnapshotSource {
    async fn get_by_id(&self, id: &str, options: &QueryOptions) -> Result<Value, SourceError> {
        let idx = self
            .by_id
            .get(id)
            .ok_or_else(|| SourceError::NotFound(id.to_owned()))?;
        Ok(self.with_links(&self.documents[*idx], options))
    }

    async fn query(&self, options: &QueryOptions, page: u32, page_size: u32) -> Result<Page, SourceError> {
        if page == 0 || page_size == 0 {
            return Err(SourceError::InvalidPage(format!(
                "page {page} of size {page_size}"
            )));
        }

        let matching: Vec<&Value> = self
            .documents
            .iter()
            .filter(|doc| options.accepts_lang(doc.get("lang").and_then(Value::as_str)))
            .collect();

        let size = page_size as usize;
        let total_pages = matching.len().div_ceil(size).max(1) as u32;
        let results = matching
            .into_iter()
            .skip((page as usize - 1) * size)
            .take(size)
            .map(|doc| self.with_links(doc, options))
            .collect();

        Ok(Page {
            results,
            page,
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fetch_all_documents;
    use serde_json::json;

    fn snapshot() -> SnapshotSource {
        SnapshotSource::new(vec![
            json!({ "id": "A", "type": "post", "lang": "en-us", "data": {
                "author": { "link_type": "Document", "type": "author", "id": "C" }
            } }),
            json!({ "id": "B", "type": "post", "lang": "fr-fr", "data": {} }),
            json!({ "id": "C", "type": "author", "lang": "en-us", "data": {
                "name": "Ada", "bio": "long"
            } }),
        ])
    }

    #[test]
    fn test_from_json_envelope() {
        let source = SnapshotSource::from_json(r#"{ "results": [{ "id": "A" }], "page": 1 }"#).unwrap();
        assert_eq!(source.len(), 1);
        let source = SnapshotSource::from_json(r#"[{ "id": "A" }, { "id": "B" }]"#).unwrap();
        assert_eq!(source.len(), 2);
        assert!(SnapshotSource::from_json("{").is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("documents.json");
        fs::write(&path, r#"[{ "id": "A" }]"#).unwrap();
        assert_eq!(SnapshotSource::from_path(&path).unwrap().len(), 1);
        assert!(matches!(
            SnapshotSource::from_path(&dir.path().join("missing.json")),
            Err(SourceError::Io(..))
        ));
    }

    #[tokio::test]
    async fn test_paging_and_lang() {
        let source = snapshot();
        let all = fetch_all_documents(&source, &QueryOptions::default(), 2).await.unwrap();
        assert_eq!(all.len(), 3);

        let options = QueryOptions {
            lang: Some("en-us".into()),
            ..QueryOptions::default()
        };
        let page = source.query(&options, 1, 1).await.unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.results[0]["id"], "A");
        assert!(source.query(&options, 0, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_links_are_embedded() {
        let source = snapshot();
        let options = QueryOptions {
            fetch_links: vec!["author.name".into()],
            ..QueryOptions::default()
        };
        let doc = source.get_by_id("A", &options).await.unwrap();
        assert_eq!(doc["data"]["author"]["data"], json!({ "name": "Ada" }));

        let plain = source.get_by_id("A", &QueryOptions::default()).await.unwrap();
        assert!(plain["data"]["author"].get("data").is_none());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let result = snapshot().get_by_id("Z", &QueryOptions::default()).await;
        assert!(matches!(result, Err(SourceError::NotFound(id)) if id == "Z"));
    }
}
