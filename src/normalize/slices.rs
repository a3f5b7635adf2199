//! Slice zones.
//!
//! Every slice of a zone becomes its own entity; the zone's normalized value
//! is the ordered list of those entity ids.

use futures::future::try_join_all;
use serde_json::{Map, Value};

use super::{DocContext, NormalizeError, Normalizer};
use crate::{
    graph::{Entity, NodeKey},
    schema::naming::pascal_case,
    type_paths::{TypeDescriptor, extend_path},
};

static EMPTY_LIST: Value = Value::Array(Vec::new());

/// `depth` is the path of the object holding the zone.
pub(super) async fn normalize(
    normalizer: &Normalizer,
    zone: &str,
    value: &Value,
    depth: &[String],
    ctx: &DocContext<'_>,
) -> Result<Value, NormalizeError> {
    let Some(slices) = value.as_array() else {
        return Ok(value.clone());
    };

    let ids = try_join_all(
        slices
            .iter()
            .enumerate()
            .map(|(index, slice)| slice_entity(normalizer, zone, index, slice, depth, ctx)),
    )
    .await?;

    Ok(Value::Array(ids.into_iter().map(Value::String).collect()))
}

async fn slice_entity(
    normalizer: &Normalizer,
    zone: &str,
    index: usize,
    slice: &Value,
    depth: &[String],
    ctx: &DocContext<'_>,
) -> Result<String, NormalizeError> {
    let slice_type = slice.get("slice_type").and_then(Value::as_str).unwrap_or_default();
    let id = normalizer.ids().node_id(&NodeKey::Slice {
        custom_type: ctx.custom_type,
        document_id: ctx.doc_id,
        zone,
        index,
    });

    let slice_path = extend_path(depth, &[zone, slice_type]);
    let primary_path = extend_path(&slice_path, &["primary"]);
    let items_path = extend_path(&slice_path, &["items"]);
    let empty = Value::Object(Map::new());
    let primary = slice.get("primary").filter(|v| !v.is_null()).unwrap_or(&empty);
    let items = slice.get("items").filter(|v| !v.is_null()).unwrap_or(&EMPTY_LIST);

    let (primary, items) = futures::try_join!(
        normalizer.normalize_object(primary, &primary_path, ctx),
        normalizer.normalize_list(items, &items_path, ctx),
    )?;

    let mut fields = slice.as_object().cloned().unwrap_or_default();
    fields.insert("primary".to_owned(), primary);
    fields.insert("items".to_owned(), items);

    let type_name = match normalizer.type_paths().get(&slice_path) {
        Some(TypeDescriptor::Object(name)) => name.clone(),
        _ => pascal_case(&["Prismic", ctx.custom_type, zone, slice_type]),
    };
    normalizer
        .store()
        .create_entity(Entity::new(&id, type_name, fields, slice));
    Ok(id)
}
