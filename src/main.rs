//! prismic-graph - derive types and build content graphs from Prismic schemas.

use anyhow::{Context, Result};
use clap::Parser;
use prismic_graph::{
    build::build_graph,
    cli::{Cli, Commands},
    config::SourceConfig,
    log,
    preview::{PreviewLocation, PreviewSession, merge_preview_data},
    schema::SchemaSet,
    source::SnapshotSource,
    type_paths::{TypePathIndex, type_paths_filename},
};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Build { clean, .. } => {
            let config = load_config(&cli)?;
            build_graph(&config, *clean).await.map(|_| ())
        }
        Commands::Preview {
            location,
            static_data,
            type_paths,
        } => {
            let config = load_config(&cli)?;
            preview(&config, location, static_data.as_deref(), type_paths.as_deref()).await
        }
        Commands::Merge {
            static_data,
            preview,
            output,
        } => merge(static_data.as_deref(), preview.as_deref(), output.as_deref()),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SourceConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = SourceConfig::from_path(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    config.update_with_cli(cli);
    config.validate(cli.is_build())?;

    Ok(config)
}

async fn preview(
    config: &SourceConfig,
    location: &str,
    static_data: Option<&Path>,
    type_paths: Option<&Path>,
) -> Result<()> {
    let type_paths = match type_paths {
        Some(path) => path.to_path_buf(),
        None => exported_type_paths(config)?,
    };
    let index = TypePathIndex::load(&type_paths)
        .with_context(|| format!("Failed to load type paths from {}", type_paths.display()))?;
    let source = SnapshotSource::from_path(&config.build.documents)?;

    let session = PreviewSession::from_config(config, Arc::new(index), Arc::new(source))?;
    let location = PreviewLocation::parse(location);
    if !location.is_preview() {
        log!("warn"; "location carries no preview token and document id");
    }
    let mut result = session.run(&location).await?;

    if let Some(path) = static_data {
        let static_data = read_json(path)?;
        result.preview_data = Some(merge_preview_data(Some(&static_data), result.preview_data.as_ref())?);
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// The type-path file a build with the current schemas wrote.
fn exported_type_paths(config: &SourceConfig) -> Result<PathBuf> {
    let digest = SchemaSet::load_dir(&config.build.schemas)
        .context("Pass --type-paths or make [build.schemas] available")?
        .digest();
    Ok(config
        .build
        .output
        .join(type_paths_filename(&config.type_paths_prefix(), &digest)))
}

fn merge(static_data: Option<&Path>, preview: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let static_data = static_data.map(read_json).transpose()?;
    let preview = preview.map(read_json).transpose()?;
    let merged = merge_preview_data(static_data.as_ref(), preview.as_ref())?;
    let merged = serde_json::to_string_pretty(&merged)?;

    match output {
        Some(path) => fs::write(path, merged)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{merged}"),
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Malformed JSON in {}", path.display()))
}
