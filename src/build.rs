//! Graph building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_graph()
//!     │
//!     ├── derive_types()
//!     │       │
//!     │       └── schemas/*.json → schema.graphql + {prefix}{digest}.json
//!     │
//!     ├── fetch_all_documents() ──► every document, page by page
//!     │
//!     └── normalize_documents()
//!             │
//!             └── Documents normalized concurrently → nodes.json
//! ```

use crate::{
    config::SourceConfig,
    graph::{MemoryStore, NodeIdFactory},
    hooks::Hooks,
    log,
    logger::ProgressBars,
    normalize::Normalizer,
    schema::{DerivedTypes, SchemaSet, derive_schema_set},
    source::{QueryOptions, SnapshotSource, fetch_all_documents},
    type_paths::type_paths_filename,
};
use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

pub const SCHEMA_FILE: &str = "schema.graphql";
pub const NODES_FILE: &str = "nodes.json";

/// Files written by a build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub schema: PathBuf,
    pub type_paths: PathBuf,
    pub nodes: PathBuf,
    pub documents: usize,
    pub entities: usize,
}

/// Derive types, then fetch and normalize every document.
///
/// When `clean` is true, clears the output directory first.
pub async fn build_graph(config: &SourceConfig, clean: bool) -> Result<BuildReport> {
    let output = &config.build.output;
    prepare_output(output, clean)?;

    let schemas = SchemaSet::load_dir(&config.build.schemas)?;
    let digest = schemas.digest();
    let derived = derive_schema_set(&schemas);
    let (schema, type_paths) = write_types(&derived, output, &config.type_paths_prefix(), &digest)?;

    let source = SnapshotSource::from_path(&config.build.documents)?;
    let options = QueryOptions::from_config(&config.repository);
    let documents = fetch_all_documents(&source, &options, config.build.page_size).await?;

    let store = Arc::new(MemoryStore::new());
    let ids = NodeIdFactory::new(&config.build.namespace).context("Invalid [build.namespace]")?;
    let normalizer = Normalizer::build(
        Arc::new(derived.type_paths),
        store.clone(),
        ids,
        Hooks::from_config(config, store.clone(), ids),
    );
    normalize_documents(&normalizer, &documents).await?;

    let nodes = output.join(NODES_FILE);
    let graph = serde_json::to_string_pretty(&store.snapshot())?;
    fs::write(&nodes, graph).with_context(|| format!("Failed to write {}", nodes.display()))?;

    log!("build"; "done, {} documents, {} entities", documents.len(), store.len());
    Ok(BuildReport {
        schema,
        type_paths,
        nodes,
        documents: documents.len(),
        entities: store.len(),
    })
}

fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// Write the SDL and the exported type-path index.
fn write_types(
    derived: &DerivedTypes,
    output: &Path,
    prefix: &str,
    digest: &str,
) -> Result<(PathBuf, PathBuf)> {
    let schema = output.join(SCHEMA_FILE);
    fs::write(&schema, derived.to_sdl())
        .with_context(|| format!("Failed to write {}", schema.display()))?;

    let type_paths = derived
        .type_paths
        .write_to(output, &type_paths_filename(prefix, digest))
        .context("Failed to export type paths")?;
    log!(
        "types";
        "{} types, {} paths → {}",
        derived.type_defs.len(),
        derived.type_paths.len(),
        type_paths.display()
    );
    Ok((schema, type_paths))
}

async fn normalize_documents(normalizer: &Normalizer, documents: &[Value]) -> Result<Vec<String>> {
    let progress = ProgressBars::new(&[("nodes", documents.len())]);
    let result = try_join_all(documents.iter().map(|doc| {
        let progress = &progress;
        async move {
            let id = normalizer.document_to_entities(doc).await.with_context(|| {
                let id = doc.get("id").and_then(Value::as_str).unwrap_or("?");
                format!("Failed to normalize document {id}")
            })?;
            progress.inc_by_name("nodes");
            anyhow::Ok(id)
        }
    }))
    .await;
    progress.finish();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_paths::TypePathIndex;
    use serde_json::json;
    use tempfile::TempDir;

    fn project() -> (TempDir, SourceConfig) {
        let dir = TempDir::new().unwrap();
        let schemas = dir.path().join("schemas");
        fs::create_dir_all(&schemas).unwrap();
        fs::write(
            schemas.join("page.json"),
            r#"{ "Main": {
                "uid": { "type": "UID" },
                "title": { "type": "StructuredText" },
                "hero": { "type": "Image" }
            } }"#,
        )
        .unwrap();

        let documents = json!([
            { "id": "P1", "uid": "home", "type": "page", "lang": "en-us", "data": {
                "title": [{ "type": "heading1", "text": "Home", "spans": [] }],
                "hero": { "url": "https://images.prismic.io/repo/hero.png", "alt": null }
            } },
            { "id": "P2", "uid": "about", "type": "page", "lang": "en-us", "data": {
                "title": [], "hero": {}
            } }
        ]);
        fs::write(dir.path().join("documents.json"), documents.to_string()).unwrap();

        let mut config = SourceConfig::from_str(
            r#"
            [repository]
            name = "my-repo"

            [build]
            page_size = 1

            [links.routes]
            page = "/:uid"
        "#,
        )
        .unwrap();
        config.build.schemas = schemas;
        config.build.documents = dir.path().join("documents.json");
        config.build.output = dir.path().join("public");
        (dir, config)
    }

    #[tokio::test]
    async fn test_build_graph() {
        let (_dir, config) = project();
        let report = build_graph(&config, false).await.unwrap();

        assert_eq!(report.documents, 2);
        // two documents and one registered image
        assert_eq!(report.entities, 3);

        let sdl = fs::read_to_string(&report.schema).unwrap();
        assert!(sdl.contains("type PrismicPage"));

        let file_name = report.type_paths.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("prismic-typepaths---my-repo-"));
        let index = TypePathIndex::load(&report.type_paths).unwrap();
        assert!(!index.is_empty());

        let nodes: Value = serde_json::from_str(&fs::read_to_string(&report.nodes).unwrap()).unwrap();
        let home = nodes
            .as_object()
            .unwrap()
            .values()
            .find(|node| node["prismicId"] == "P1")
            .unwrap();
        assert_eq!(home["url"], "/home");
        assert_eq!(home["data"]["title"]["text"], "Home");
        assert!(home["data"]["hero"]["localFile"].is_string());
    }

    #[tokio::test]
    async fn test_clean_output() {
        let (_dir, config) = project();
        fs::create_dir_all(&config.build.output).unwrap();
        let stale = config.build.output.join("stale.json");
        fs::write(&stale, "{}").unwrap();

        build_graph(&config, false).await.unwrap();
        assert!(stale.exists());
        build_graph(&config, true).await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_missing_schemas() {
        let (_dir, mut config) = project();
        config.build.schemas = config.build.output.join("nope");
        assert!(build_graph(&config, false).await.is_err());
    }
}
