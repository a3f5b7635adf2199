//! Image fields.
//!
//! An image value holds the base image under fixed keys; every other key is
//! a thumbnail with the same shape. Base and thumbnails are materialized
//! independently. Materialization never fails the field: on error the
//! `localFile` reference is simply `null`.

use futures::future::join_all;
use serde_json::{Map, Value};

use super::{DocContext, Normalizer};
use crate::{hooks::FieldScope, log};

pub const IMAGE_BASE_KEYS: [&str; 5] = ["dimensions", "alt", "copyright", "url", "localFile"];

pub(super) async fn normalize(normalizer: &Normalizer, key: &str, value: &Value, ctx: &DocContext<'_>) -> Value {
    let Some(image) = value.as_object() else {
        return value.clone();
    };

    let (base, thumbnails): (Map<String, Value>, Map<String, Value>) = image
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(k, _)| IMAGE_BASE_KEYS.contains(&k.as_str()));
    let base = Value::Object(base);

    let thumbnails = join_all(thumbnails.iter().map(|(name, thumbnail)| async move {
        (name.clone(), variant(normalizer, key, thumbnail, ctx).await)
    }));
    let (base, thumbnails) = futures::join!(variant(normalizer, key, &base, ctx), thumbnails);

    let mut out = match base {
        Value::Object(base) => base,
        _ => Map::new(),
    };
    out.extend(thumbnails);
    Value::Object(out)
}

/// One image variant with its `localFile` reference set.
async fn variant(normalizer: &Normalizer, key: &str, value: &Value, ctx: &DocContext<'_>) -> Value {
    let Some(image) = value.as_object() else {
        return value.clone();
    };
    let mut out = image.clone();
    let local_file = match image.get("url").and_then(Value::as_str) {
        Some(url) if !url.is_empty() => materialize(normalizer, key, value, url, ctx).await,
        _ => None,
    };
    out.insert("localFile".to_owned(), local_file.map_or(Value::Null, Value::String));
    Value::Object(out)
}

async fn materialize(
    normalizer: &Normalizer,
    key: &str,
    value: &Value,
    url: &str,
    ctx: &DocContext<'_>,
) -> Option<String> {
    if !normalizer.mode().materializes_assets() {
        return None;
    }
    let hooks = normalizer.hooks();
    let materializer = hooks.materializer.as_ref()?;
    if !hooks.asset_policy.should_materialize(&FieldScope::field(key, value, ctx.doc)) {
        return None;
    }

    let decoded = urlencoding::decode(url).map_or_else(|_| url.to_owned(), |s| s.into_owned());
    match materializer.materialize(&decoded, ctx.node_id).await {
        Ok(file_id) => Some(file_id),
        Err(err) => {
            log!("images"; "{err}");
            None
        }
    }
}
