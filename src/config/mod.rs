//! Source configuration management for `prismic.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                         |
//! |----------------|-------------------------------------------------|
//! | `[repository]` | Repository name, token, language, fetch links   |
//! | `[build]`      | Schema/snapshot/output paths, paging, ids       |
//! | `[images]`     | Image asset materialization                     |
//! | `[links]`      | Route patterns for the link resolver            |
//!
//! # Example
//!
//! ```toml
//! [repository]
//! name = "my-blog"
//!
//! [build]
//! schemas = "custom_types"
//! output = "public"
//!
//! [images]
//! skip_fields = ["og_image"]
//!
//! [links.routes]
//! blog_post = "/blog/:uid"
//! ```

mod build;
pub mod defaults;
mod error;
mod images;
mod links;
mod repository;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use images::ImagesConfig;
pub use links::LinksConfig;
pub use repository::RepositoryConfig;

use crate::cli::{Cli, Commands};
use educe::Educe;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Repository names are DNS labels.
static REPOSITORY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("static regex"));

/// `custom_type.field`
static FETCH_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_.-]+$").expect("static regex"));

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing prismic.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Repository to read from
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Image asset settings
    #[serde(default)]
    pub images: ImagesConfig,

    /// Link resolver routes
    #[serde(default)]
    pub links: LinksConfig,
}

impl SourceConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Type-path file prefix, falling back to one derived from the repository name.
    pub fn type_paths_prefix(&self) -> String {
        self.build
            .type_paths_prefix
            .clone()
            .unwrap_or_else(|| defaults::type_paths_prefix(&self.repository.name))
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root, &cli.config);

        if let Commands::Build { page_size: Some(size), .. } = &cli.command {
            self.build.page_size = *size;
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config));
        self.build.schemas = Self::normalize_path(&root.join(&self.build.schemas));
        self.build.documents = Self::normalize_path(&root.join(&self.build.documents));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate the configuration, reporting every violation at once.
    ///
    /// `require_inputs` additionally checks that the schema directory and
    /// document snapshot exist (build only; previews read neither).
    pub fn validate(&self, require_inputs: bool) -> Result<(), ConfigError> {
        let mut violations = Vec::new();

        let name = &self.repository.name;
        if name.is_empty() {
            violations.push("[repository.name] is required".to_owned());
        } else if !REPOSITORY_NAME.is_match(name) {
            violations.push(format!(
                "[repository.name] `{name}` may only contain lowercase letters, digits and `-`"
            ));
        }

        if self.repository.lang.trim().is_empty() {
            violations.push("[repository.lang] must not be empty, use `*` for every language".into());
        }

        for link in &self.repository.fetch_links {
            if !FETCH_LINK.is_match(link) {
                violations.push(format!(
                    "[repository.fetch_links] `{link}` must have the form `custom_type.field`"
                ));
            }
        }

        if !(1..=100).contains(&self.build.page_size) {
            violations.push(format!(
                "[build.page_size] must be between 1 and 100, got {}",
                self.build.page_size
            ));
        }

        if uuid::Uuid::parse_str(&self.build.namespace).is_err() {
            violations.push(format!("[build.namespace] `{}` is not a UUID", self.build.namespace));
        }

        if self.build.type_paths_prefix.as_deref().is_some_and(str::is_empty) {
            violations.push("[build.type_paths_prefix] must not be empty".into());
        }

        let routes = self.links.routes.iter().map(|r| ("routes", r));
        let preview_routes = self.links.preview_routes.iter().map(|r| ("preview_routes", r));
        for (table, (custom_type, route)) in routes.chain(preview_routes) {
            if !route.starts_with('/') {
                violations.push(format!(
                    "[links.{table}.{custom_type}] `{route}` must start with `/`"
                ));
            }
        }

        if require_inputs {
            if !self.build.schemas.is_dir() {
                violations.push(format!(
                    "[build.schemas] directory `{}` not found",
                    self.build.schemas.display()
                ));
            }
            if !self.build.documents.is_file() {
                violations.push(format!(
                    "[build.documents] file `{}` not found",
                    self.build.documents.display()
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(violations))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid() -> SourceConfig {
        SourceConfig::from_str(
            r#"
            [repository]
            name = "my-blog"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_str() {
        let config = valid();
        assert_eq!(config.repository.name, "my-blog");
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SourceConfig::from_str("[repository\nname = \"x\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_from_path_missing() {
        let dir = TempDir::new().unwrap();
        let result = SourceConfig::from_path(&dir.path().join("prismic.toml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_type_paths_prefix() {
        let mut config = valid();
        assert_eq!(config.type_paths_prefix(), "prismic-typepaths---my-blog-");

        config.build.type_paths_prefix = Some("tp-".into());
        assert_eq!(config.type_paths_prefix(), "tp-");
    }

    #[test]
    fn test_get_root_default() {
        let config = SourceConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_validate_reports_every_violation() {
        let config = SourceConfig::from_str(
            r#"
            [repository]
            name = "My Blog"
            fetch_links = ["author"]

            [build]
            page_size = 0
            namespace = "not-a-uuid"
            type_paths_prefix = ""

            [links.routes]
            page = ":uid"
        "#,
        )
        .unwrap();

        let Err(ConfigError::Validation(violations)) = config.validate(false) else {
            panic!("expected validation error");
        };
        assert_eq!(violations.len(), 6);
        assert!(violations[0].starts_with("[repository.name]"));
        assert!(violations[1].starts_with("[repository.fetch_links]"));
        assert!(violations[2].starts_with("[build.page_size]"));
        assert!(violations[3].starts_with("[build.namespace]"));
        assert!(violations[4].starts_with("[build.type_paths_prefix]"));
        assert!(violations[5].starts_with("[links.routes.page]"));
    }

    #[test]
    fn test_validate_missing_name() {
        let config = SourceConfig::default();
        let Err(ConfigError::Validation(violations)) = config.validate(false) else {
            panic!("expected validation error");
        };
        assert_eq!(violations, vec!["[repository.name] is required"]);
    }

    #[test]
    fn test_validate_inputs() {
        let dir = TempDir::new().unwrap();
        let mut config = valid();
        config.update_path_with_root(dir.path(), Path::new("prismic.toml"));

        let Err(ConfigError::Validation(violations)) = config.validate(true) else {
            panic!("expected validation error");
        };
        assert_eq!(violations.len(), 2);

        fs::create_dir(dir.path().join("schemas")).unwrap();
        fs::write(dir.path().join("documents.json"), "[]").unwrap();
        config.update_path_with_root(dir.path(), Path::new("prismic.toml"));
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_paths_are_rooted() {
        let dir = TempDir::new().unwrap();
        let mut config = valid();
        config.update_path_with_root(dir.path(), Path::new("prismic.toml"));

        assert!(config.build.schemas.is_absolute());
        assert!(config.build.output.ends_with("public"));
        assert!(config.config_path.ends_with("prismic.toml"));
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = SourceConfig::from_str("[unknown_section]\nfield = \"value\"");
        assert!(result.is_err());
    }
}
