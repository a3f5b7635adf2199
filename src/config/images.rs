//! `[images]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[images]` section in prismic.toml - image asset materialization.
///
/// # Example
/// ```toml
/// [images]
/// normalize = true
/// skip_fields = ["og_image"]   # Never materialize these field keys
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// Materialize image assets as `File` nodes during builds.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub normalize: bool,

    /// Field keys whose images are never materialized.
    #[serde(default)]
    pub skip_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SourceConfig;

    #[test]
    fn test_images_config() {
        let config = r#"
            [images]
            normalize = false
            skip_fields = ["og_image"]
        "#;
        let config: SourceConfig = toml::from_str(config).unwrap();

        assert!(!config.images.normalize);
        assert_eq!(config.images.skip_fields, vec!["og_image"]);
    }

    #[test]
    fn test_images_config_defaults() {
        let config: SourceConfig = toml::from_str("").unwrap();
        assert!(config.images.normalize);
        assert!(config.images.skip_fields.is_empty());
    }
}
