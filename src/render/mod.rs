//! Rich text rendering.
//!
//! Structured text is a list of blocks, each with plain `text` and a list
//! of `spans` addressing ranges of that text in UTF-16 code units:
//!
//! ```json
//! [
//!   { "type": "heading1", "text": "Hello", "spans": [] },
//!   { "type": "paragraph", "text": "Bold move", "spans": [
//!       { "start": 0, "end": 4, "type": "strong" }
//!   ] }
//! ]
//! ```

mod rich_text;

pub use rich_text::{as_html, as_text, link_url};

use serde_json::Value;

/// Kind of a rendered element, block or inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Heading(u8),
    Paragraph,
    Preformatted,
    ListItem,
    OListItem,
    /// Run of consecutive `ListItem` blocks.
    List,
    /// Run of consecutive `OListItem` blocks.
    OList,
    Image,
    Embed,
    Strong,
    Em,
    Hyperlink,
    Label,
    /// Plain text leaf.
    Span,
}

impl ElementKind {
    pub fn from_api_name(name: &str) -> Option<Self> {
        Some(match name {
            "heading1" => Self::Heading(1),
            "heading2" => Self::Heading(2),
            "heading3" => Self::Heading(3),
            "heading4" => Self::Heading(4),
            "heading5" => Self::Heading(5),
            "heading6" => Self::Heading(6),
            "paragraph" => Self::Paragraph,
            "preformatted" => Self::Preformatted,
            "list-item" => Self::ListItem,
            "o-list-item" => Self::OListItem,
            "group-list-item" => Self::List,
            "group-o-list-item" => Self::OList,
            "image" => Self::Image,
            "embed" => Self::Embed,
            "strong" => Self::Strong,
            "em" => Self::Em,
            "hyperlink" => Self::Hyperlink,
            "label" => Self::Label,
            "span" => Self::Span,
            _ => return None,
        })
    }

    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Heading(1) => "heading1",
            Self::Heading(2) => "heading2",
            Self::Heading(3) => "heading3",
            Self::Heading(4) => "heading4",
            Self::Heading(5) => "heading5",
            Self::Heading(_) => "heading6",
            Self::Paragraph => "paragraph",
            Self::Preformatted => "preformatted",
            Self::ListItem => "list-item",
            Self::OListItem => "o-list-item",
            Self::List => "group-list-item",
            Self::OList => "group-o-list-item",
            Self::Image => "image",
            Self::Embed => "embed",
            Self::Strong => "strong",
            Self::Em => "em",
            Self::Hyperlink => "hyperlink",
            Self::Label => "label",
            Self::Span => "span",
        }
    }
}

/// An element handed to an [`HtmlSerializer`](crate::hooks::HtmlSerializer).
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    pub kind: ElementKind,
    /// Raw block, span data or, for leaves and list groups, `null`.
    pub data: &'a Value,
    /// Plain text covered by the element.
    pub text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_names() {
        for name in ["heading3", "o-list-item", "group-list-item", "hyperlink", "span"] {
            assert_eq!(ElementKind::from_api_name(name).unwrap().api_name(), name);
        }
        assert_eq!(ElementKind::from_api_name("marquee"), None);
    }
}
