//! Structured text to HTML and plain text.

use std::cmp::Reverse;

use quick_xml::escape::escape;
use serde_json::Value;

use super::{Element, ElementKind};
use crate::hooks::{FieldScope, HtmlSerializer, LinkResolver};

static NULL: Value = Value::Null;

/// Plain text of every block, joined with a single space.
pub fn as_text(blocks: &Value) -> String {
    blocks
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// URL of a link value.
///
/// Document links go through the resolver; web and media links carry
/// their own `url`.
pub fn link_url(link: &Value, scope: &FieldScope<'_>, resolver: &dyn LinkResolver) -> Option<String> {
    match link.get("link_type").and_then(Value::as_str) {
        Some("Document") => resolver.resolve(scope, link),
        _ => link.get("url").and_then(Value::as_str).map(str::to_owned),
    }
}

/// Render structured text as HTML.
///
/// Consecutive list items are grouped into `<ul>`/`<ol>`. The serializer is
/// asked first for every element; unknown block types are skipped.
pub fn as_html(
    blocks: &Value,
    scope: &FieldScope<'_>,
    resolver: &dyn LinkResolver,
    serializer: &dyn HtmlSerializer,
) -> String {
    let Some(blocks) = blocks.as_array() else {
        return String::new();
    };
    let renderer = Renderer {
        scope,
        resolver,
        serializer,
    };

    let mut out = String::new();
    let mut group: Option<(ElementKind, String)> = None;

    for block in blocks {
        let Some(kind) = block
            .get("type")
            .and_then(Value::as_str)
            .and_then(ElementKind::from_api_name)
        else {
            continue;
        };
        let html = renderer.block(kind, block);
        let list = match kind {
            ElementKind::ListItem => Some(ElementKind::List),
            ElementKind::OListItem => Some(ElementKind::OList),
            _ => None,
        };

        if let Some((open, items)) = &mut group
            && Some(*open) == list
        {
            items.push_str(&html);
            continue;
        }

        if let Some((open, items)) = group.take() {
            out.push_str(&renderer.element(open, &NULL, "", items));
        }
        match list {
            Some(list) => group = Some((list, html)),
            None => out.push_str(&html),
        }
    }

    if let Some((open, items)) = group {
        out.push_str(&renderer.element(open, &NULL, "", items));
    }
    out
}

struct Span<'a> {
    start: usize,
    end: usize,
    kind: ElementKind,
    raw: &'a Value,
}

fn parse_spans(block: &Value, len: usize) -> Vec<Span<'_>> {
    let mut spans: Vec<_> = block
        .get("spans")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|raw| {
            let start = raw.get("start")?.as_u64()? as usize;
            let end = raw.get("end")?.as_u64()? as usize;
            let kind = ElementKind::from_api_name(raw.get("type")?.as_str()?)?;
            let inline = matches!(
                kind,
                ElementKind::Strong | ElementKind::Em | ElementKind::Hyperlink | ElementKind::Label
            );
            (inline && start < end && end <= len).then_some(Span {
                start,
                end,
                kind,
                raw,
            })
        })
        .collect();
    // outer spans first
    spans.sort_by_key(|span| (span.start, Reverse(span.end)));
    spans
}

struct Renderer<'a> {
    scope: &'a FieldScope<'a>,
    resolver: &'a dyn LinkResolver,
    serializer: &'a dyn HtmlSerializer,
}

impl Renderer<'_> {
    fn element(&self, kind: ElementKind, data: &Value, text: &str, children: String) -> String {
        let element = Element { kind, data, text };
        self.serializer
            .serialize(self.scope, &element, &children)
            .unwrap_or_else(|| self.standard(&element, children))
    }

    fn block(&self, kind: ElementKind, block: &Value) -> String {
        let text = block.get("text").and_then(Value::as_str).unwrap_or_default();
        let units: Vec<u16> = text.encode_utf16().collect();
        let spans = parse_spans(block, units.len());
        let spans: Vec<&Span<'_>> = spans.iter().collect();
        let children = self.range(&units, 0, units.len(), &spans);
        self.element(kind, block, text, children)
    }

    /// Render `units[lo..hi]`. `spans` lie within the range, outer first.
    ///
    /// A span that starts inside a sibling but ends past it cannot nest and
    /// is dropped.
    fn range(&self, units: &[u16], lo: usize, hi: usize, spans: &[&Span<'_>]) -> String {
        let mut out = String::new();
        let mut pos = lo;
        let mut idx = 0;

        while idx < spans.len() {
            let span = spans[idx];
            if span.start < pos {
                idx += 1;
                continue;
            }
            out.push_str(&self.leaf(&units[pos..span.start]));

            let mut next = idx + 1;
            let mut inner = Vec::new();
            while next < spans.len() && spans[next].start < span.end {
                if spans[next].end <= span.end {
                    inner.push(spans[next]);
                }
                next += 1;
            }

            let children = self.range(units, span.start, span.end, &inner);
            let text = String::from_utf16_lossy(&units[span.start..span.end]);
            out.push_str(&self.element(span.kind, span.raw, &text, children));
            pos = span.end;
            idx = next;
        }

        out.push_str(&self.leaf(&units[pos..hi]));
        out
    }

    fn leaf(&self, units: &[u16]) -> String {
        if units.is_empty() {
            return String::new();
        }
        let text = String::from_utf16_lossy(units);
        let escaped = escape(text.as_str()).replace('\n', "<br />");
        self.element(ElementKind::Span, &NULL, &text, escaped)
    }

    fn standard(&self, element: &Element<'_>, children: String) -> String {
        let data = element.data;
        let attr = |value: &Value, key: &str| {
            escape(value.get(key).and_then(Value::as_str).unwrap_or_default()).into_owned()
        };
        let label = match data.get("label").and_then(Value::as_str) {
            Some(label) => format!(" class=\"{}\"", escape(label)),
            None => String::new(),
        };

        match element.kind {
            ElementKind::Heading(level) => format!("<h{level}{label}>{children}</h{level}>"),
            ElementKind::Paragraph => format!("<p{label}>{children}</p>"),
            ElementKind::Preformatted => format!("<pre{label}>{children}</pre>"),
            ElementKind::ListItem | ElementKind::OListItem => format!("<li{label}>{children}</li>"),
            ElementKind::List => format!("<ul>{children}</ul>"),
            ElementKind::OList => format!("<ol>{children}</ol>"),
            ElementKind::Strong => format!("<strong>{children}</strong>"),
            ElementKind::Em => format!("<em>{children}</em>"),
            ElementKind::Span => children,
            ElementKind::Label => {
                let class = data.get("data").map(|d| attr(d, "label")).unwrap_or_default();
                format!("<span class=\"{class}\">{children}</span>")
            }
            ElementKind::Hyperlink => {
                let link = data.get("data").unwrap_or(&NULL);
                let url = link_url(link, self.scope, self.resolver).unwrap_or_default();
                let target = match link.get("target").and_then(Value::as_str) {
                    Some(target) => format!(" target=\"{}\" rel=\"noopener\"", escape(target)),
                    None => String::new(),
                };
                format!("<a href=\"{}\"{target}>{children}</a>", escape(url.as_str()))
            }
            ElementKind::Image => {
                let img = format!(
                    "<img src=\"{}\" alt=\"{}\" copyright=\"{}\" />",
                    attr(data, "url"),
                    attr(data, "alt"),
                    attr(data, "copyright"),
                );
                let img = match data
                    .get("linkTo")
                    .and_then(|link| link_url(link, self.scope, self.resolver))
                {
                    Some(url) => format!("<a href=\"{}\">{img}</a>", escape(url.as_str())),
                    None => img,
                };
                format!("<p class=\"block-img\">{img}</p>")
            }
            ElementKind::Embed => {
                let oembed = data.get("oembed").unwrap_or(&NULL);
                format!(
                    "<div data-oembed=\"{}\" data-oembed-type=\"{}\" data-oembed-provider=\"{}\">{}</div>",
                    attr(oembed, "embed_url"),
                    attr(oembed, "type"),
                    attr(oembed, "provider_name"),
                    oembed.get("html").and_then(Value::as_str).unwrap_or_default(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{NoHtmlSerializer, RouteLinkResolver};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn render(blocks: &Value) -> String {
        let doc = json!({});
        let scope = FieldScope::field("body", blocks, &doc);
        let resolver = RouteLinkResolver::new(BTreeMap::from([("page".to_owned(), "/:uid".to_owned())]));
        as_html(blocks, &scope, &resolver, &NoHtmlSerializer)
    }

    #[test]
    fn test_as_text() {
        let blocks = json!([
            { "type": "heading1", "text": "Title", "spans": [] },
            { "type": "image", "url": "https://x/a.png" },
            { "type": "paragraph", "text": "Body", "spans": [] }
        ]);
        assert_eq!(as_text(&blocks), "Title Body");
        assert_eq!(as_text(&json!(null)), "");
    }

    #[test]
    fn test_blocks_and_nested_spans() {
        let blocks = json!([
            { "type": "heading2", "text": "Hi", "spans": [] },
            { "type": "paragraph", "text": "bold and italic", "spans": [
                { "start": 0, "end": 15, "type": "strong" },
                { "start": 9, "end": 15, "type": "em" }
            ] }
        ]);
        assert_eq!(
            render(&blocks),
            "<h2>Hi</h2><p><strong>bold and <em>italic</em></strong></p>"
        );
    }

    #[test]
    fn test_list_grouping() {
        let blocks = json!([
            { "type": "list-item", "text": "a", "spans": [] },
            { "type": "list-item", "text": "b", "spans": [] },
            { "type": "o-list-item", "text": "c", "spans": [] },
            { "type": "paragraph", "text": "d", "spans": [] }
        ]);
        assert_eq!(render(&blocks), "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>");
    }

    #[test]
    fn test_utf16_offsets() {
        let blocks = json!([
            { "type": "paragraph", "text": "😀 bold", "spans": [
                { "start": 3, "end": 7, "type": "strong" }
            ] }
        ]);
        assert_eq!(render(&blocks), "<p>😀 <strong>bold</strong></p>");
    }

    #[test]
    fn test_partial_overlap_is_dropped() {
        let blocks = json!([
            { "type": "paragraph", "text": "abcdef", "spans": [
                { "start": 0, "end": 3, "type": "strong" },
                { "start": 2, "end": 5, "type": "em" }
            ] }
        ]);
        assert_eq!(render(&blocks), "<p><strong>abc</strong>def</p>");
    }

    #[test]
    fn test_hyperlinks_and_escaping() {
        let blocks = json!([
            { "type": "paragraph", "text": "<go> home\nnow", "spans": [
                { "start": 5, "end": 9, "type": "hyperlink", "data": {
                    "link_type": "Document", "type": "page", "uid": "home", "id": "X1"
                } },
                { "start": 0, "end": 4, "type": "hyperlink", "data": {
                    "link_type": "Web", "url": "https://example.com", "target": "_blank"
                } }
            ] }
        ]);
        assert_eq!(
            render(&blocks),
            "<p><a href=\"https://example.com\" target=\"_blank\" rel=\"noopener\">&lt;go&gt;</a> \
             <a href=\"/home\">home</a><br />now</p>"
        );
    }

    #[test]
    fn test_image_and_embed() {
        let blocks = json!([
            { "type": "image", "url": "https://x/a.png", "alt": "A \"cat\"", "copyright": null },
            { "type": "embed", "oembed": {
                "embed_url": "https://youtu.be/1", "type": "video",
                "provider_name": "YouTube", "html": "<iframe></iframe>"
            } }
        ]);
        assert_eq!(
            render(&blocks),
            "<p class=\"block-img\"><img src=\"https://x/a.png\" alt=\"A &quot;cat&quot;\" copyright=\"\" /></p>\
             <div data-oembed=\"https://youtu.be/1\" data-oembed-type=\"video\" \
             data-oembed-provider=\"YouTube\"><iframe></iframe></div>"
        );
    }

    struct Upper;

    impl HtmlSerializer for Upper {
        fn serialize(&self, scope: &FieldScope<'_>, element: &Element<'_>, children: &str) -> Option<String> {
            (element.kind == ElementKind::Heading(1) && scope.key == Some("body"))
                .then(|| format!("<h1 class=\"big\">{}</h1>", children.to_uppercase()))
        }
    }

    #[test]
    fn test_serializer_override() {
        let blocks = json!([
            { "type": "heading1", "text": "loud", "spans": [] },
            { "type": "paragraph", "text": "quiet", "spans": [] }
        ]);
        let doc = json!({});
        let scope = FieldScope::field("body", &blocks, &doc);
        let html = as_html(&blocks, &scope, &RouteLinkResolver::default(), &Upper);
        assert_eq!(html, "<h1 class=\"big\">LOUD</h1><p>quiet</p>");
    }

    #[test]
    fn test_link_url() {
        let doc = json!({});
        let scope = FieldScope::document(&doc);
        let resolver = RouteLinkResolver::new(BTreeMap::from([("page".to_owned(), "/:uid".to_owned())]));
        let web = json!({ "link_type": "Web", "url": "https://example.com" });
        let document = json!({ "link_type": "Document", "type": "page", "uid": "about" });

        assert_eq!(link_url(&web, &scope, &resolver).as_deref(), Some("https://example.com"));
        assert_eq!(link_url(&document, &scope, &resolver).as_deref(), Some("/about"));
        assert_eq!(link_url(&json!({ "link_type": "Any" }), &scope, &resolver), None);
    }
}
