//! Custom-type schema model as exported by the Prismic custom type editor.
//!
//! ```json
//! {
//!   "Main": {
//!     "uid":   { "type": "UID", "config": { "label": "UID" } },
//!     "title": { "type": "StructuredText", "config": { "single": "heading1" } },
//!     "body":  { "type": "Slices", "config": { "choices": { ... } } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field identifier → field definition, sorted for deterministic walks.
pub type Fields = BTreeMap<String, FieldDef>;

/// A custom type: tab (section) name → fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomType {
    pub sections: BTreeMap<String, Fields>,
}

impl CustomType {
    /// Merge all tabs into one field map.
    ///
    /// Tabs are presentational only; the API returns all fields flat.
    pub fn merged_fields(&self) -> Fields {
        self.sections
            .values()
            .flat_map(|fields| fields.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}

/// One field definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Raw kind name, e.g. `"StructuredText"`.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub config: FieldConfig,

    /// Slice-only: non-repeating ("primary") fields.
    #[serde(default, rename = "non-repeat", skip_serializing_if = "BTreeMap::is_empty")]
    pub non_repeat: Fields,

    /// Slice-only: repeating ("items") fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repeat: Fields,
}

impl FieldDef {
    pub fn field_kind(&self) -> Option<FieldKind> {
        FieldKind::from_api_name(&self.kind)
    }
}

/// Kind-specific configuration. Only the keys the deriver needs are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Group sub-fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,

    /// Slice-zone choices.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub choices: Fields,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The fixed set of supported field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Uid,
    Color,
    Select,
    Text,
    StructuredText,
    Number,
    Date,
    Timestamp,
    GeoPoint,
    Embed,
    Image,
    Link,
    Group,
    Slice,
    Slices,
}

impl FieldKind {
    pub fn from_api_name(name: &str) -> Option<Self> {
        Some(match name {
            "UID" => Self::Uid,
            "Color" => Self::Color,
            "Select" => Self::Select,
            "Text" => Self::Text,
            "StructuredText" => Self::StructuredText,
            "Number" => Self::Number,
            "Date" => Self::Date,
            "Timestamp" => Self::Timestamp,
            "GeoPoint" => Self::GeoPoint,
            "Embed" => Self::Embed,
            "Image" => Self::Image,
            "Link" => Self::Link,
            "Group" => Self::Group,
            "Slice" => Self::Slice,
            "Slices" => Self::Slices,
            _ => return None,
        })
    }
}
