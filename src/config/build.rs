//! `[build]` section configuration.
//!
//! Contains input/output paths and node-graph settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in prismic.toml - build paths and graph settings.
///
/// # Example
/// ```toml
/// [build]
/// schemas = "custom_types"      # Directory of <custom_type_id>.json files
/// documents = "export.json"     # Document snapshot
/// output = "public"
/// type_paths_prefix = "typepaths-"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (set from CLI, not in config file)
    #[serde(skip)]
    pub root: Option<PathBuf>,

    /// Directory of custom-type schema files.
    #[serde(default = "defaults::build::schemas")]
    #[educe(Default = defaults::build::schemas())]
    pub schemas: PathBuf,

    /// Document snapshot the build reads from.
    #[serde(default = "defaults::build::documents")]
    #[educe(Default = defaults::build::documents())]
    pub documents: PathBuf,

    /// Output directory for the node graph, SDL and type-path index.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Prefix of the exported type-path file name.
    /// Defaults to `prismic-typepaths---{repository}-`.
    #[serde(default)]
    pub type_paths_prefix: Option<String>,

    /// Documents requested per page (1-100).
    #[serde(default = "defaults::build::page_size")]
    #[educe(Default = defaults::build::page_size())]
    pub page_size: u32,

    /// Seed UUID of the node-id namespace.
    #[serde(default = "defaults::build::namespace")]
    #[educe(Default = defaults::build::namespace())]
    pub namespace: String,
}
