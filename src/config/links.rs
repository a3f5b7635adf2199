//! `[links]` section configuration.
//!
//! Route patterns the link resolver expands per custom type.

use educe::Educe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `[links]` section in prismic.toml - document routes.
///
/// Patterns may use `:uid`, `:id`, `:lang` and `:type` placeholders.
///
/// # Example
/// ```toml
/// [links.routes]
/// page = "/:uid"
/// blog_post = "/blog/:uid"
///
/// [links.preview_routes]
/// page = "/preview/:id"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LinksConfig {
    /// Custom type id → route pattern.
    #[serde(default)]
    pub routes: BTreeMap<String, String>,

    /// Routes used for the page path of a previewed document.
    /// Types not listed fall back to `routes`.
    #[serde(default)]
    pub preview_routes: BTreeMap<String, String>,
}

impl LinksConfig {
    pub fn preview_route(&self, custom_type: &str) -> Option<&str> {
        self.preview_routes
            .get(custom_type)
            .or_else(|| self.routes.get(custom_type))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::super::SourceConfig;

    #[test]
    fn test_links_config() {
        let config = r#"
            [links.routes]
            page = "/:uid"
            blog_post = "/blog/:uid"

            [links.preview_routes]
            page = "/preview/:id"
        "#;
        let config: SourceConfig = toml::from_str(config).unwrap();

        assert_eq!(config.links.routes["blog_post"], "/blog/:uid");
        assert_eq!(config.links.preview_route("page"), Some("/preview/:id"));
        assert_eq!(config.links.preview_route("blog_post"), Some("/blog/:uid"));
        assert_eq!(config.links.preview_route("author"), None);
    }
}
