//! Composite type definitions produced by the deriver.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Marker capabilities a type implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Interface {
    /// Independently addressable entity (documents and slices).
    Node,
    /// A top-level CMS document.
    #[serde(rename = "PrismicDocument")]
    Document,
}

impl Interface {
    pub const fn sdl_name(self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::Document => "PrismicDocument",
        }
    }
}

/// Reference to a named type, optionally a list and/or non-null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    pub name: String,
    pub list: bool,
    pub required: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: false,
            required: false,
        }
    }

    pub fn list_of(name: impl Into<String>) -> Self {
        Self {
            list: true,
            ..Self::named(name)
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.list, self.required) {
            (true, true) => write!(f, "[{}!]!", self.name),
            (true, false) => write!(f, "[{}]", self.name),
            (false, true) => write!(f, "{}!", self.name),
            (false, false) => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldType {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<TypeRef> for FieldType {
    fn from(ty: TypeRef) -> Self {
        Self {
            ty,
            description: None,
        }
    }
}

impl FieldType {
    pub fn described(ty: TypeRef, description: &str) -> Self {
        Self {
            ty,
            description: Some(description.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDefKind {
    Object { fields: BTreeMap<String, FieldType> },
    Union { types: Vec<String> },
}

/// A generated composite type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeDefKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
}

impl TypeDef {
    pub fn object(name: impl Into<String>, fields: BTreeMap<String, FieldType>) -> Self {
        Self {
            name: name.into(),
            kind: TypeDefKind::Object { fields },
            interfaces: Vec::new(),
        }
    }

    pub fn union(name: impl Into<String>, types: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeDefKind::Union { types },
            interfaces: Vec::new(),
        }
    }

    pub fn with_interfaces(mut self, interfaces: &[Interface]) -> Self {
        self.interfaces = interfaces.to_vec();
        self.interfaces.sort();
        self.interfaces.dedup();
        self
    }

    pub fn implements(&self, interface: Interface) -> bool {
        self.interfaces.contains(&interface)
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, FieldType>> {
        match &self.kind {
            TypeDefKind::Object { fields } => Some(fields),
            TypeDefKind::Union { .. } => None,
        }
    }

    /// Render as GraphQL SDL.
    pub fn to_sdl(&self) -> String {
        let mut out = String::new();
        match &self.kind {
            TypeDefKind::Object { fields } => {
                out.push_str("type ");
                out.push_str(&self.name);
                if !self.interfaces.is_empty() {
                    let names: Vec<_> = self.interfaces.iter().map(|i| i.sdl_name()).collect();
                    out.push_str(&format!(" implements {}", names.join(" & ")));
                }
                out.push_str(" {\n");
                for (name, field) in fields {
                    if let Some(description) = &field.description {
                        out.push_str(&format!("  \"{}\"\n", description.replace('"', "\\\"")));
                    }
                    out.push_str(&format!("  {name}: {}\n", field.ty));
                }
                out.push('}');
            }
            TypeDefKind::Union { types } => {
                out.push_str(&format!("union {} = {}", self.name, types.join(" | ")));
            }
        }
        out
    }
}

/// Names defined by [`STANDARD_TYPES_SDL`] or referenced from it.
///
/// Derived names never take one of these.
pub const STANDARD_TYPE_NAMES: &[&str] = &[
    "PrismicStructuredTextType",
    "PrismicGeoPointType",
    "PrismicEmbedType",
    "PrismicImageDimensionsType",
    "PrismicImageType",
    "PrismicLinkTypes",
    "PrismicLinkType",
    "PrismicDocument",
    "Node",
    "File",
    "JSON",
    "Date",
];

/// Types every repository shares, independent of its custom types.
pub const STANDARD_TYPES_SDL: &str = r#""A text field with formatting options."
type PrismicStructuredTextType {
  "The HTML value of the text rendered with the HTML serializer."
  html: String
  "The plain text value of the text."
  text: String
  "The field's value exactly as returned by the API."
  raw: JSON
}

"A field for storing geo-coordinates."
type PrismicGeoPointType {
  latitude: Float
  longitude: Float
}

"Embedded videos, songs, tweets and other oEmbed resources."
type PrismicEmbedType {
  author_name: String
  author_url: String
  cache_age: String
  embed_url: String
  html: String
  name: String
  provider_name: String
  provider_url: String
  thumbnail_height: Int
  thumbnail_url: String
  thumbnail_width: Int
  title: String
  type: String
  version: String
}

"Dimensions for images."
type PrismicImageDimensionsType {
  width: Int!
  height: Int!
}

"A responsive image field. Thumbnails are siblings of the base keys."
type PrismicImageType {
  alt: String
  copyright: String
  dimensions: PrismicImageDimensionsType
  url: String
  "The locally materialized file, when the asset policy allows it."
  localFile: File
}

enum PrismicLinkTypes {
  Any
  Document
  Media
  Web
}

"Link to web, media, and internal content."
type PrismicLinkType {
  link_type: PrismicLinkTypes!
  isBroken: Boolean
  "The link URL computed by the link resolver."
  url: String
  target: String
  id: ID
  type: String
  tags: [String]
  lang: String
  slug: String
  uid: String
  "If a Document link, the linked document."
  document: PrismicAllDocumentTypes
  raw: JSON
}

interface PrismicDocument {
  dataString: String
  first_publication_date: Date
  href: String
  id: ID!
  lang: String
  last_publication_date: Date
  type: String
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        assert_eq!(TypeRef::named("String").to_string(), "String");
        assert_eq!(TypeRef::named("ID").required().to_string(), "ID!");
        assert_eq!(TypeRef::list_of("PrismicPageLinksGroupType").to_string(), "[PrismicPageLinksGroupType]");
        assert_eq!(TypeRef::list_of("String").required().to_string(), "[String!]!");
    }

    #[test]
    fn test_object_sdl() {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_owned(), FieldType::described(TypeRef::named("String"), "The \"title\"."));
        fields.insert("id".to_owned(), TypeRef::named("ID").required().into());
        let def = TypeDef::object("PrismicPage", fields).with_interfaces(&[Interface::Node, Interface::Document]);

        let sdl = def.to_sdl();
        assert!(sdl.starts_with("type PrismicPage implements Node & PrismicDocument {"));
        assert!(sdl.contains("  id: ID!\n"));
        assert!(sdl.contains("  \"The \\\"title\\\".\"\n  title: String\n"));
        assert!(def.implements(Interface::Document));
    }

    #[test]
    fn test_union_sdl() {
        let def = TypeDef::union("PrismicPageBodySlicesType", vec!["A".into(), "B".into()]);
        assert_eq!(def.to_sdl(), "union PrismicPageBodySlicesType = A | B");
        assert!(def.fields().is_none());
    }

    #[test]
    fn test_standard_names_cover_standard_sdl() {
        for name in STANDARD_TYPE_NAMES {
            assert!(STANDARD_TYPES_SDL.contains(name), "{name} missing from standard SDL");
        }
        for line in STANDARD_TYPES_SDL.lines() {
            let declared = ["type ", "enum ", "interface "]
                .iter()
                .find_map(|keyword| line.strip_prefix(keyword))
                .and_then(|rest| rest.split_whitespace().next());
            if let Some(name) = declared {
                assert!(STANDARD_TYPE_NAMES.contains(&name), "{name} is not reserved");
            }
        }
    }
}
