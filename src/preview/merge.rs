//! Merge a live preview result into statically built data.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::log;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("nothing to merge: provide static data, preview data or both")]
    NoData,

    #[error("{0} data must be a JSON object")]
    NotAnObject(&'static str),

    #[error("preview data is empty")]
    EmptyPreview,

    #[error("preview document `{0}` has no id")]
    MissingPreviewId(String),
}

/// Merge `preview` into a copy of `static_data`.
///
/// When the preview's top-level key exists in the static data the two are
/// deep merged. Otherwise every node of the static tree whose `id` equals
/// the previewed document's id receives the preview's `data`. Arrays are
/// always replaced, never merged element-wise.
pub fn merge_preview_data(
    static_data: Option<&Value>,
    preview: Option<&Value>,
) -> Result<Value, MergeError> {
    let (static_data, preview) = match (static_data, preview) {
        (None, None) => return Err(MergeError::NoData),
        (Some(static_data), None) => return Ok(static_data.clone()),
        (None, Some(preview)) => return Ok(preview.clone()),
        (Some(static_data), Some(preview)) => (static_data, preview),
    };

    let Value::Object(mut merged) = static_data.clone() else {
        return Err(MergeError::NotAnObject("static"));
    };
    let preview = preview.as_object().ok_or(MergeError::NotAnObject("preview"))?;
    let (key, document) = preview.iter().next().ok_or(MergeError::EmptyPreview)?;

    if merged.contains_key(key) {
        log!("merge"; "merging `{key}` into static data");
        deep_merge_object(&mut merged, preview);
        return Ok(Value::Object(merged));
    }

    let preview_id = document
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| MergeError::MissingPreviewId(key.clone()))?;
    let patch = Map::from_iter([(
        "data".to_owned(),
        document.get("data").cloned().unwrap_or(Value::Null),
    )]);

    let mut merged = Value::Object(merged);
    let replaced = merge_by_id(&mut merged, preview_id, &patch);
    log!("merge"; "`{key}` not in static data, updated {replaced} node(s) with id {preview_id}");
    Ok(merged)
}

/// Deep merge where anything that is not object-into-object is replaced.
fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => deep_merge_object(target, source),
        (target, source) => *target = source.clone(),
    }
}

fn deep_merge_object(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge `patch` into every object whose `id` is `id`. Returns the count.
///
/// A matched node is not searched further.
fn merge_by_id(node: &mut Value, id: &str, patch: &Map<String, Value>) -> usize {
    match node {
        Value::Object(object) if object.get("id").and_then(Value::as_str) == Some(id) => {
            deep_merge_object(object, patch);
            1
        }
        Value::Object(object) => object
            .values_mut()
            .map(|child| merge_by_id(child, id, patch))
            .sum(),
        Value::Array(items) => items
            .iter_mut()
            .map(|child| merge_by_id(child, id, patch))
            .sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_key_deep_merges_and_replaces_arrays() {
        let static_data = json!({
            "page": { "id": "p1", "uid": "home", "data": { "title": "Old", "items": [1, 2] } },
            "site": { "title": "Site" }
        });
        let preview = json!({ "page": { "id": "p1", "data": { "title": "New", "items": [9] } } });

        let merged = merge_preview_data(Some(&static_data), Some(&preview)).unwrap();
        assert_eq!(
            merged,
            json!({
                "page": { "id": "p1", "uid": "home", "data": { "title": "New", "items": [9] } },
                "site": { "title": "Site" }
            })
        );
        // the caller's copy is untouched
        assert_eq!(static_data["page"]["data"]["title"], "Old");
    }

    #[test]
    fn test_traversal_merge_updates_nested_node_only() {
        let static_data = json!({
            "allPrismicPage": { "nodes": [
                { "id": "p1", "data": { "title": "One", "tags": ["a", "b"] } },
                { "id": "p2", "data": { "title": "Two", "tags": ["c"] } }
            ] },
            "menu": { "items": [{ "link": { "id": "p2", "data": { "title": "Two" } } }] }
        });
        let preview = json!({ "prismicPage": { "id": "p2", "data": { "title": "Draft", "tags": [] } } });

        let merged = merge_preview_data(Some(&static_data), Some(&preview)).unwrap();
        assert_eq!(merged["allPrismicPage"]["nodes"][0], static_data["allPrismicPage"]["nodes"][0]);
        assert_eq!(
            merged["allPrismicPage"]["nodes"][1],
            json!({ "id": "p2", "data": { "title": "Draft", "tags": [] } })
        );
        assert_eq!(merged["menu"]["items"][0]["link"]["data"]["title"], "Draft");
        assert!(merged.get("prismicPage").is_none());
    }

    #[test]
    fn test_missing_sides() {
        let data = json!({ "page": {} });
        assert_eq!(merge_preview_data(Some(&data), None).unwrap(), data);
        assert_eq!(merge_preview_data(None, Some(&data)).unwrap(), data);
        assert!(matches!(merge_preview_data(None, None), Err(MergeError::NoData)));
    }

    #[test]
    fn test_invalid_preview() {
        let static_data = json!({ "page": {} });
        assert!(matches!(
            merge_preview_data(Some(&static_data), Some(&json!({}))),
            Err(MergeError::EmptyPreview)
        ));
        assert!(matches!(
            merge_preview_data(Some(&static_data), Some(&json!({ "post": { "data": {} } }))),
            Err(MergeError::MissingPreviewId(key)) if key == "post"
        ));
        assert!(matches!(
            merge_preview_data(Some(&json!([])), Some(&json!({ "post": {} }))),
            Err(MergeError::NotAnObject("static"))
        ));
    }
}
