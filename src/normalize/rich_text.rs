//! Rich text fields become `{ html, text, raw }`.

use serde_json::{Value, json};

use super::{DocContext, Normalizer};
use crate::{hooks::FieldScope, render};

pub(super) fn normalize(normalizer: &Normalizer, key: &str, value: &Value, ctx: &DocContext<'_>) -> Value {
    let scope = FieldScope::field(key, value, ctx.doc);
    let hooks = normalizer.hooks();
    json!({
        "html": render::as_html(value, &scope, &*hooks.link_resolver, &*hooks.html_serializer),
        "text": render::as_text(value),
        "raw": value,
    })
}
