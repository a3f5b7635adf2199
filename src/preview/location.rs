//! Preview request location.
//!
//! The CMS redirects editors to the site with `?token=<ref>&documentId=<id>`.
//! The token is itself a URL: `https://{repo}.prismic.io/previews/{session}:{version}?websitePreviewId={id}`.

use std::collections::BTreeMap;

/// Query pairs of a URL or bare search string, decoded.
fn query_pairs(input: &str) -> BTreeMap<String, String> {
    let without_fragment = input.split('#').next().unwrap_or(input);
    let query = match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None if without_fragment.contains('=') => without_fragment,
        None => "",
    };

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .map(|(key, value)| (decode(key), decode(value)))
        .collect()
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw).map_or_else(|_| raw.clone(), |s| s.into_owned())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewLocation {
    pub token: Option<String>,
    pub document_id: Option<String>,
}

impl PreviewLocation {
    /// Parse a full URL or a `?key=value` search string.
    pub fn parse(url_or_search: &str) -> Self {
        let mut pairs = query_pairs(url_or_search);
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            token: non_empty(pairs.remove("token")),
            document_id: non_empty(pairs.remove("documentId")),
        }
    }

    /// A preview needs both the token and the document id.
    pub fn is_preview(&self) -> bool {
        self.token.is_some() && self.document_id.is_some()
    }

    /// Link that opens the same preview session for someone else.
    ///
    /// Empty when this is not a preview.
    pub fn share_link(&self, repository: &str) -> String {
        let (Some(token), Some(document_id)) = (&self.token, &self.document_id) else {
            return String::new();
        };

        let (base, token_query) = token.split_once('?').unwrap_or((token, ""));
        let preview_id = query_pairs(&format!("?{token_query}")).remove("websitePreviewId");
        let version = base.split(':').nth(2).map(str::to_owned);

        // sorted keys, absent values omitted
        let params: Vec<String> = [
            ("document", Some(document_id.clone())),
            ("previewId", preview_id),
            ("version", version),
        ]
        .into_iter()
        .filter_map(|(key, value)| Some(format!("{key}={}", urlencoding::encode(&value?))))
        .collect();

        format!(
            "https://{repository}.prismic.io/previews/session/draft?{}",
            params.join("&")
        )
    }
}
