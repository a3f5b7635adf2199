//! Custom-type schemas and the types derived from them.
//!
//! # Architecture
//!
//! ```text
//! schemas/*.json ──► SchemaSet ──► derive_schema_set() ──► DerivedTypes
//!                        │                                   ├── type_defs  (GraphQL SDL)
//!                        │                                   └── type_paths (exported index)
//!                        └── digest() ──► type-path file name
//! ```

mod derive;
mod model;
pub mod naming;
pub mod types;

pub use derive::{
    ALL_DOCUMENT_TYPES, DerivedTypes, TypeSink, UID_FIELD, all_documents_union,
    derive_custom_type, derive_schema_set,
};
pub use model::{CustomType, FieldConfig, FieldDef, FieldKind, Fields};

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::ConfigError;

/// All custom types of a repository, keyed by custom type API id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSet {
    custom_types: BTreeMap<String, CustomType>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, custom_type: CustomType) {
        self.custom_types.insert(id.into(), custom_type);
    }

    pub fn get(&self, id: &str) -> Option<&CustomType> {
        self.custom_types.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CustomType)> {
        self.custom_types.iter()
    }

    pub fn len(&self) -> usize {
        self.custom_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom_types.is_empty()
    }

    /// Load every `<custom_type_id>.json` below `dir`.
    ///
    /// All unreadable or malformed files are reported together.
    pub fn load_dir(dir: &Path) -> Result<Self, ConfigError> {
        if !dir.is_dir() {
            return Err(ConfigError::Validation(vec![format!(
                "[build.schemas] directory `{}` not found",
                dir.display()
            )]));
        }

        let mut schemas = Self::new();
        let mut violations = Vec::new();

        let files = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"));

        for entry in files {
            let path = entry.path();
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                violations.push(format!("schema file `{}` has no usable name", path.display()));
                continue;
            };

            let parsed = fs::read_to_string(path)
                .map_err(|err| err.to_string())
                .and_then(|content| {
                    serde_json::from_str::<CustomType>(&content).map_err(|err| err.to_string())
                });

            match parsed {
                Ok(_) if schemas.get(id).is_some() => {
                    violations.push(format!("custom type `{id}` is defined more than once"));
                }
                Ok(custom_type) => schemas.insert(id, custom_type),
                Err(err) => violations.push(format!("schema `{}`: {err}", path.display())),
            }
        }

        if schemas.is_empty() && violations.is_empty() {
            violations.push(format!("no custom type schemas found in `{}`", dir.display()));
        }

        if violations.is_empty() {
            Ok(schemas)
        } else {
            Err(ConfigError::Validation(violations))
        }
    }

    /// Content fingerprint of the whole set.
    ///
    /// Maps are sorted, so equal schemas always hash equally.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(&self.custom_types).unwrap_or_default();
        hex::encode(blake3::hash(&bytes).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"{ "Main": { "title": { "type": "StructuredText" } } }"#;

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.json"), PAGE).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let schemas = SchemaSet::load_dir(dir.path()).unwrap();
        assert_eq!(schemas.len(), 1);
        assert!(schemas.get("page").is_some());
    }

    #[test]
    fn test_load_dir_reports_every_bad_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), "{ not json").unwrap();
        fs::write(dir.path().join("b.json"), "[1, 2]").unwrap();

        let Err(ConfigError::Validation(violations)) = SchemaSet::load_dir(dir.path()) else {
            panic!("expected validation error");
        };
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("a.json"));
        assert!(violations[1].contains("b.json"));
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = TempDir::new().unwrap();
        let result = SchemaSet::load_dir(&dir.path().join("missing"));
        assert!(matches!(result, Err(ConfigError::Validation(v)) if v[0].contains("not found")));
    }

    #[test]
    fn test_digest_tracks_content() {
        let mut a = SchemaSet::new();
        a.insert("page", serde_json::from_str(PAGE).unwrap());
        let mut b = SchemaSet::new();
        b.insert("page", serde_json::from_str(PAGE).unwrap());
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);

        b.insert("post", serde_json::from_str(PAGE).unwrap());
        assert_ne!(a.digest(), b.digest());
    }
}
