//! Flattened path → type lookup table.
//!
//! Built once while walking the custom-type schemas and consumed while
//! normalizing documents. The index is also exported to disk so a preview
//! session can make exactly the same normalization decisions without access
//! to the schemas.
//!
//! # File Format
//!
//! ```json
//! [
//!   { "path": ["page"], "type": { "kind": "object", "name": "PrismicPage" } },
//!   { "path": ["page", "data", "title"], "type": { "kind": "rich_text" } },
//!   { "path": ["page", "data", "body"], "type": { "kind": "slices", "name": "PrismicPageBodySlicesType" } }
//! ]
//! ```
//!
//! The file name embeds the schema fingerprint
//! (`{prefix}{digest}.json`), so a schema change invalidates old previews.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::log;

pub const RICH_TEXT_TYPE: &str = "PrismicStructuredTextType";
pub const LINK_TYPE: &str = "PrismicLinkType";
pub const IMAGE_TYPE: &str = "PrismicImageType";

/// Resolved type of a structural path.
///
/// The variant alone decides which field normalizer runs; names are kept for
/// type registration and presentation only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// Passed through unchanged (`String`, `Float`, `Date`, geo-point, embed).
    Scalar(String),
    RichText,
    Link,
    Image,
    /// Non-repeating composite (document, data, slice, slice primary).
    Object(String),
    /// Repeatable list of sub-objects (group fields, slice items).
    Group(String),
    /// Slice zone: list of slice entities, union over the zone's choices.
    Slices(String),
}

impl TypeDescriptor {
    /// Named type this descriptor refers to.
    pub fn type_name(&self) -> &str {
        match self {
            Self::RichText => RICH_TEXT_TYPE,
            Self::Link => LINK_TYPE,
            Self::Image => IMAGE_TYPE,
            Self::Scalar(name) | Self::Object(name) | Self::Group(name) | Self::Slices(name) => {
                name
            }
        }
    }

    /// Whether the value at this path is a list.
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::Group(_) | Self::Slices(_))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list() {
            write!(f, "[{}]", self.type_name())
        } else {
            f.write_str(self.type_name())
        }
    }
}

/// One index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePath {
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

/// Type-path persistence errors
#[derive(Debug, Error)]
pub enum TypePathError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed type-path index")]
    Json(#[from] serde_json::Error),
}

/// Ordered, append-only path → type index with exact-match lookup.
#[derive(Debug, Clone, Default)]
pub struct TypePathIndex {
    entries: Vec<TypePath>,
    lookup: FxHashMap<Vec<String>, usize>,
}

impl TypePathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    ///
    /// Returns `false` when the path is already indexed. A conflicting
    /// descriptor keeps the first entry.
    pub fn push(&mut self, path: Vec<String>, ty: TypeDescriptor) -> bool {
        if let Some(&existing) = self.lookup.get(&path) {
            let current = &self.entries[existing].ty;
            if *current != ty {
                log!("warn"; "type path {} already maps to `{current}`, ignoring `{ty}`", path.join("."));
            }
            return false;
        }
        self.lookup.insert(path.clone(), self.entries.len());
        self.entries.push(TypePath { path, ty });
        true
    }

    /// Exact structural-path lookup.
    pub fn get(&self, path: &[String]) -> Option<&TypeDescriptor> {
        self.lookup.get(path).map(|&idx| &self.entries[idx].ty)
    }

    pub fn extend(&mut self, other: Self) {
        for entry in other.entries {
            self.push(entry.path, entry.ty);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypePath> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, TypePathError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    pub fn from_json(content: &str) -> Result<Self, TypePathError> {
        let entries: Vec<TypePath> = serde_json::from_str(content)?;
        Ok(entries.into_iter().collect())
    }

    /// Write the index to `dir/filename`, creating `dir` if needed.
    pub fn write_to(&self, dir: &Path, filename: &str) -> Result<PathBuf, TypePathError> {
        fs::create_dir_all(dir).map_err(|err| TypePathError::Io(dir.to_path_buf(), err))?;
        let path = dir.join(filename);
        fs::write(&path, self.to_json()?).map_err(|err| TypePathError::Io(path.clone(), err))?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, TypePathError> {
        let content =
            fs::read_to_string(path).map_err(|err| TypePathError::Io(path.to_path_buf(), err))?;
        Self::from_json(&content)
    }
}

impl FromIterator<TypePath> for TypePathIndex {
    fn from_iter<I: IntoIterator<Item = TypePath>>(iter: I) -> Self {
        let mut index = Self::new();
        for entry in iter {
            index.push(entry.path, entry.ty);
        }
        index
    }
}

/// File name of an exported index: `{prefix}{digest}.json`.
pub fn type_paths_filename(prefix: &str, schemas_digest: &str) -> String {
    format!("{prefix}{schemas_digest}.json")
}

/// Root-relative URL a preview client fetches the index from.
pub fn type_paths_url(prefix: &str, schemas_digest: &str) -> String {
    format!("/{}", type_paths_filename(prefix, schemas_digest))
}

/// Build a path from string segments.
pub fn path_of(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| (*s).to_owned()).collect()
}

/// Path `depth` followed by `segments`.
pub fn extend_path(depth: &[String], segments: &[&str]) -> Vec<String> {
    let mut path = Vec::with_capacity(depth.len() + segments.len());
    path.extend_from_slice(depth);
    path.extend(segments.iter().map(|s| (*s).to_owned()));
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TypePathIndex {
        let mut index = TypePathIndex::new();
        index.push(path_of(&["page"]), TypeDescriptor::Object("PrismicPage".into()));
        index.push(path_of(&["page", "data", "title"]), TypeDescriptor::RichText);
        index.push(
            path_of(&["page", "data", "body"]),
            TypeDescriptor::Slices("PrismicPageBodySlicesType".into()),
        );
        index
    }

    #[test]
    fn test_lookup_is_exact() {
        let index = sample();
        assert_eq!(
            index.get(&path_of(&["page", "data", "title"])),
            Some(&TypeDescriptor::RichText)
        );
        assert_eq!(index.get(&path_of(&["page", "title"])), None);
        assert_eq!(index.get(&path_of(&["data", "page", "title"])), None);
    }

    #[test]
    fn test_duplicate_path_keeps_first() {
        let mut index = sample();
        assert!(!index.push(path_of(&["page", "data", "title"]), TypeDescriptor::Link));
        assert_eq!(index.len(), 3);
        assert_eq!(
            index.get(&path_of(&["page", "data", "title"])),
            Some(&TypeDescriptor::RichText)
        );
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["path"], serde_json::json!(["page"]));
        assert_eq!(value[0]["type"]["kind"], "object");
        assert_eq!(value[1]["type"], serde_json::json!({ "kind": "rich_text" }));
        assert_eq!(value[2]["type"]["name"], "PrismicPageBodySlicesType");
    }

    #[test]
    fn test_reload_preserves_order_and_lookup() {
        let index = sample();
        let reloaded = TypePathIndex::from_json(&index.to_json().unwrap()).unwrap();
        let paths: Vec<_> = reloaded.iter().map(|e| e.path.join(".")).collect();
        assert_eq!(paths, vec!["page", "page.data.title", "page.data.body"]);
        assert_eq!(
            reloaded.get(&path_of(&["page", "data", "body"])),
            Some(&TypeDescriptor::Slices("PrismicPageBodySlicesType".into()))
        );
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let filename = type_paths_filename("prismic-typepaths---repo-", "abc123");
        let path = sample().write_to(&dir.path().join("public"), &filename).unwrap();
        assert!(path.ends_with("prismic-typepaths---repo-abc123.json"));

        let loaded = TypePathIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_display_marks_lists() {
        assert_eq!(TypeDescriptor::Group("PrismicPageLinksGroupType".into()).to_string(), "[PrismicPageLinksGroupType]");
        assert_eq!(TypeDescriptor::Image.to_string(), "PrismicImageType");
        assert_eq!(type_paths_url("p-", "d"), "/p-d.json");
    }
}
