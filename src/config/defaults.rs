//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [repository] Section Defaults
// ============================================================================

pub mod repository {
    /// Query every language.
    pub fn lang() -> String {
        "*".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn schemas() -> PathBuf {
        "schemas".into()
    }

    pub fn documents() -> PathBuf {
        "documents.json".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    /// The API caps pages at 100 documents.
    pub fn page_size() -> u32 {
        100
    }

    /// Seed of the node-id namespace.
    pub fn namespace() -> String {
        "638f7a53-c567-4eca-8fc1-b23efb1cfb2b".into()
    }
}

/// Prefix of the exported type-path file when none is configured.
pub fn type_paths_prefix(repository: &str) -> String {
    if repository.is_empty() {
        "prismic-typepaths---".into()
    } else {
        format!("prismic-typepaths---{repository}-")
    }
}
