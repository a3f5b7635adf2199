//! Link fields.
//!
//! Output is the raw link plus `url`, `document` and `raw`. `document` is
//! the linked document's node id, never the document itself.

use serde_json::Value;

use super::{DocContext, LinkMode, NormalizeError, Normalizer};
use crate::{hooks::FieldScope, log, render};

/// `(custom type, id)` of a document link.
pub(super) fn document_target(link: &Value) -> Option<(&str, &str)> {
    if link.get("link_type").and_then(Value::as_str) != Some("Document") {
        return None;
    }
    let custom_type = link.get("type")?.as_str()?;
    let id = link.get("id")?.as_str()?;
    Some((custom_type, id))
}

/// Prismic marks links to deleted or unpublished documents as broken.
pub fn is_broken(link: &Value) -> bool {
    link.get("isBroken").and_then(Value::as_bool) == Some(true)
}

pub(super) async fn normalize(
    normalizer: &Normalizer,
    key: &str,
    value: &Value,
    ctx: &DocContext<'_>,
) -> Result<Value, NormalizeError> {
    let Some(link) = value.as_object() else {
        return Ok(value.clone());
    };

    let scope = FieldScope::field(key, value, ctx.doc);
    let url = render::link_url(value, &scope, &*normalizer.hooks().link_resolver);

    let document = match document_target(value) {
        Some((custom_type, id)) => {
            let node_id = normalizer.ids().document_id(custom_type, id);
            if let LinkMode::Fetch { .. } = normalizer.link_mode()
                && !is_broken(value)
            {
                fetch_linked(normalizer, id, &node_id).await?;
            }
            Value::String(node_id)
        }
        None => Value::Null,
    };

    let mut out = link.clone();
    out.insert("url".to_owned(), url.map_or(Value::Null, Value::String));
    out.insert("document".to_owned(), document);
    out.insert("raw".to_owned(), value.clone());
    Ok(Value::Object(out))
}

/// Fetch and normalize a linked document unless it is present or claimed.
///
/// The claim happens before the fetch, so a cycle back to a document still
/// being normalized stops here.
async fn fetch_linked(normalizer: &Normalizer, id: &str, node_id: &str) -> Result<(), NormalizeError> {
    let LinkMode::Fetch { source, options } = normalizer.link_mode() else {
        return Ok(());
    };
    let store = normalizer.store();
    if !store.claim(node_id) {
        return Ok(());
    }

    log!("preview"; "fetching linked document {id}");
    let result = async {
        let doc = source.get_by_id(id, options).await?;
        normalizer.document_to_entities(&doc).await
    }
    .await;

    if let Err(err) = result {
        store.release(node_id);
        return Err(err);
    }
    Ok(())
}
