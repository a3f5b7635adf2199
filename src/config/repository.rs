//! `[repository]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[repository]` section in prismic.toml - which repository to read from.
///
/// # Example
/// ```toml
/// [repository]
/// name = "my-blog"
/// lang = "en-us"
/// fetch_links = ["author.name"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Repository name, the `{name}` in `https://{name}.prismic.io`.
    #[serde(default)]
    pub name: String,

    /// Language filter, `*` for every language.
    #[serde(default = "defaults::repository::lang")]
    #[educe(Default = defaults::repository::lang())]
    pub lang: String,

    /// Linked-document fields to embed in link values (`type.field`).
    #[serde(default)]
    pub fetch_links: Vec<String>,

    /// Content release ref. `None` reads the master ref.
    #[serde(default, rename = "ref")]
    pub release_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SourceConfig;

    #[test]
    fn test_repository_config() {
        let config = r#"
            [repository]
            name = "my-blog"
            lang = "en-us"
            fetch_links = ["author.name", "author.avatar"]
            ref = "release-1"
        "#;
        let config: SourceConfig = toml::from_str(config).unwrap();

        assert_eq!(config.repository.name, "my-blog");
        assert_eq!(config.repository.lang, "en-us");
        assert_eq!(config.repository.fetch_links.len(), 2);
        assert_eq!(config.repository.release_ref.as_deref(), Some("release-1"));
    }

    #[test]
    fn test_repository_config_defaults() {
        let config: SourceConfig = toml::from_str("[repository]\nname = \"x\"").unwrap();

        assert_eq!(config.repository.lang, "*");
        assert!(config.repository.fetch_links.is_empty());
        assert!(config.repository.release_ref.is_none());
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [repository]
            name = "x"
            api_key = "nope"
        "#;
        let result: Result<SourceConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }

    #[test]
    fn test_access_token_is_not_a_setting() {
        // documents come from a JSON export, so there is no API to authenticate against
        let result: Result<SourceConfig, _> =
            toml::from_str("[repository]\nname = \"x\"\naccess_token = \"secret\"");
        assert!(result.is_err());
    }
}
