//! CMS document sources.
//!
//! The normalizer never talks to the CMS directly. Builds page through
//! [`fetch_all_documents`]; previews fetch linked documents one by one
//! through [`DocumentSource::get_by_id`].

mod snapshot;

pub use snapshot::SnapshotSource;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{config::RepositoryConfig, log};

/// Query parameters shared by every request of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// `None` or `*` for every language.
    pub lang: Option<String>,
    /// Linked-document fields to embed (`custom_type.field`).
    pub fetch_links: Vec<String>,
    /// Content release ref; `None` reads the master ref.
    #[serde(rename = "ref")]
    pub release_ref: Option<String>,
}

impl QueryOptions {
    pub fn from_config(repository: &RepositoryConfig) -> Self {
        Self {
            lang: Some(repository.lang.clone()),
            fetch_links: repository.fetch_links.clone(),
            release_ref: repository.release_ref.clone(),
        }
    }

    /// Whether a document in `lang` passes the language filter.
    pub fn accepts_lang(&self, lang: Option<&str>) -> bool {
        match self.lang.as_deref() {
            None | Some("*") => true,
            Some(wanted) => lang == Some(wanted),
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub results: Vec<Value>,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed document data")]
    Json(#[from] serde_json::Error),

    #[error("document `{0}` not found")]
    NotFound(String),

    #[error("invalid page request: {0}")]
    InvalidPage(String),
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch one raw document by its CMS id.
    async fn get_by_id(&self, id: &str, options: &QueryOptions) -> Result<Value, SourceError>;

    /// Fetch one page (1-based) of all documents.
    async fn query(&self, options: &QueryOptions, page: u32, page_size: u32) -> Result<Page, SourceError>;
}

/// Accumulate every page.
///
/// Any failing page fails the whole fetch; nothing partial is returned.
pub async fn fetch_all_documents(
    source: &dyn DocumentSource,
    options: &QueryOptions,
    page_size: u32,
) -> Result<Vec<Value>, SourceError> {
    let mut documents = Vec::new();
    let mut page = 1;

    loop {
        let response = source.query(options, page, page_size).await?;
        log!("source"; "fetched page {page}/{} ({} documents)", response.total_pages.max(1), response.results.len());
        documents.extend(response.results);

        if page >= response.total_pages {
            break;
        }
        page += 1;
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Three pages; optionally fails on one of them.
    struct Paged {
        fail_on: Option<u32>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl DocumentSource for Paged {
        async fn get_by_id(&self, id: &str, _: &QueryOptions) -> Result<Value, SourceError> {
            Err(SourceError::NotFound(id.to_owned()))
        }

        async fn query(&self, _: &QueryOptions, page: u32, _: u32) -> Result<Page, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(page) {
                return Err(SourceError::InvalidPage(format!("page {page} unavailable")));
            }
            Ok(Page {
                results: vec![json!({ "id": format!("doc-{page}") })],
                page,
                total_pages: 3,
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_all_pages() {
        let source = Paged { fail_on: None, calls: AtomicU32::new(0) };
        let documents = fetch_all_documents(&source, &QueryOptions::default(), 1).await.unwrap();
        let ids: Vec<_> = documents.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["doc-1", "doc-2", "doc-3"]);
    }

    #[tokio::test]
    async fn test_failing_page_fails_everything() {
        let source = Paged { fail_on: Some(2), calls: AtomicU32::new(0) };
        let result = fetch_all_documents(&source, &QueryOptions::default(), 1).await;
        assert!(matches!(result, Err(SourceError::InvalidPage(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lang_filter() {
        let mut options = QueryOptions::default();
        assert!(options.accepts_lang(Some("fr-fr")));
        options.lang = Some("*".into());
        assert!(options.accepts_lang(None));
        options.lang = Some("en-us".into());
        assert!(options.accepts_lang(Some("en-us")));
        assert!(!options.accepts_lang(Some("fr-fr")));
    }
}
