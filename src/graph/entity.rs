//! Content entities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bookkeeping every entity carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Internal {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(rename = "contentDigest")]
    pub content_digest: String,
}

/// A uniquely identified, independently addressable unit of content.
///
/// Serialized flat: `{ "id": .., "internal": {..}, ...fields }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub internal: Internal,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entity {
    /// Build an entity whose digest is taken over `digest_source`.
    ///
    /// `id` and `internal` keys inside `fields` are dropped; the entity's own
    /// values always win.
    pub fn new(
        id: impl Into<String>,
        ty: impl Into<String>,
        mut fields: Map<String, Value>,
        digest_source: &Value,
    ) -> Self {
        fields.remove("id");
        fields.remove("internal");
        Self {
            id: id.into(),
            internal: Internal {
                ty: ty.into(),
                content_digest: content_digest(digest_source),
            },
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.internal.ty
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The entity as one JSON object.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 2);
        object.insert("id".to_owned(), Value::String(self.id.clone()));
        object.insert(
            "internal".to_owned(),
            serde_json::json!({
                "type": self.internal.ty,
                "contentDigest": self.internal.content_digest,
            }),
        );
        object.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Object(object)
    }
}

/// Stable content fingerprint: blake3 over the JSON serialization.
///
/// `serde_json` maps are key-sorted, so equal values hash equally.
pub fn content_digest(value: &Value) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hex::encode(blake3::hash(&bytes).as_bytes())
}
