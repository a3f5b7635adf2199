//! Derived type names.
//!
//! Names are the PascalCase concatenation of the structural context, e.g.
//! `["Prismic", "page", "body", "quote", "Primary Type"]` →
//! `PrismicPageBodyQuotePrimaryType`.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;

/// Word separators: anything that is not an ASCII letter or digit.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("static regex"));

/// Fold words into a PascalCase identifier.
///
/// Non-ASCII input is transliterated first so identifiers stay ASCII.
pub fn pascal_case<S: AsRef<str>>(words: &[S]) -> String {
    let mut out = String::new();
    for word in words {
        let ascii = deunicode::deunicode(word.as_ref());
        for piece in SEPARATOR.split(&ascii).filter(|p| !p.is_empty()) {
            let mut chars = piece.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.extend(chars);
            }
        }
    }
    out
}

/// Lower-case the first character of a PascalCase identifier.
pub fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Registry of derived names for one derivation session.
///
/// Each name is bound to the structural owner (a path plus role) that
/// produced it. Asking again for the same owner returns the same name; a
/// different owner folding to a taken name gets the next free numeric
/// suffix. Walks are ordered, so suffixes are stable across runs.
#[derive(Debug, Default)]
pub struct TypeNamer {
    by_owner: FxHashMap<String, String>,
    owners: FxHashMap<String, String>,
}

impl TypeNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A namer whose `reserved` names are already taken.
    ///
    /// A derived name folding to one of them gets a numeric suffix.
    pub fn with_reserved(reserved: &[&str]) -> Self {
        let mut namer = Self::new();
        for name in reserved {
            namer.owners.insert((*name).to_owned(), format!("reserved:{name}"));
        }
        namer
    }

    pub fn name_for<S: AsRef<str>>(&mut self, owner: &str, words: &[S]) -> String {
        if let Some(name) = self.by_owner.get(owner) {
            return name.clone();
        }

        let base = pascal_case(words);
        let mut name = base.clone();
        let mut suffix = 2;
        while self.owners.contains_key(&name) {
            name = format!("{base}{suffix}");
            suffix += 1;
        }

        self.owners.insert(name.clone(), owner.to_owned());
        self.by_owner.insert(owner.to_owned(), name.clone());
        name
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case(&["Prismic", "blog_post", "Data Type"]), "PrismicBlogPostDataType");
        assert_eq!(pascal_case(&["Prismic page body", "Slices Type"]), "PrismicPageBodySlicesType");
        assert_eq!(pascal_case(&["prismic", "callToAction"]), "PrismicCallToAction");
        assert_eq!(pascal_case(&["Prismic", "café-menu"]), "PrismicCafeMenu");
        assert_eq!(pascal_case::<&str>(&[]), "");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("PrismicBlogPost"), "prismicBlogPost");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn test_namer_is_idempotent_per_owner() {
        let mut namer = TypeNamer::new();
        let a = namer.name_for("page/data/links", &["Prismic", "page", "links", "Group Type"]);
        let b = namer.name_for("page/data/links", &["Prismic", "page", "links", "Group Type"]);
        assert_eq!(a, "PrismicPageLinksGroupType");
        assert_eq!(a, b);
        assert_eq!(namer.len(), 1);
    }

    #[test]
    fn test_namer_separates_colliding_owners() {
        let mut namer = TypeNamer::new();
        // "page_body" + "x" and "page" + "body_x" fold to the same words
        let first = namer.name_for("page_body/data/x", &["Prismic", "page_body", "x", "Group Type"]);
        let second = namer.name_for("page/data/body_x", &["Prismic", "page", "body_x", "Group Type"]);
        assert_eq!(first, "PrismicPageBodyXGroupType");
        assert_eq!(second, "PrismicPageBodyXGroupType2");
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let mut namer = TypeNamer::with_reserved(&["PrismicImageType"]);
        let name = namer.name_for("image_type#document", &["Prismic", "image_type"]);
        assert_eq!(name, "PrismicImageType2");
    }
}
