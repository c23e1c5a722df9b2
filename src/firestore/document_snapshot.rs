//! Firestore DocumentSnapshot and its raw wire payload

use super::field_value::{get_field, FieldValue, MapValue};
use super::timestamp::DateTag;
use crate::error::{FirebaseError, FirestoreError};
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use tracing::warn;

/// Document payload exactly as the bridge delivers it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocPayload {
    /// Whether the document exists
    #[serde(default)]
    pub exists: bool,

    /// Document id
    #[serde(default)]
    pub id: String,

    /// Field mapping, read only from the `_data` key the native side emits
    ///
    /// A `data` key is treated like any other unknown key and ignored.
    #[serde(rename = "_data", default, deserialize_with = "null_as_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,

    /// Opaque native reference handle
    #[serde(rename = "ref", default)]
    pub reference: serde_json::Value,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Firestore document snapshot
///
/// Built from a [`RawDocPayload`]. For an existing document, every top-level
/// field holding a tagged timestamp string is decoded into
/// [`FieldValue::Timestamp`]. Nested maps and arrays are left untouched, so a
/// tagged string two levels down stays a string.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    raw: RawDocPayload,
    data: MapValue,
}

impl DocumentSnapshot {
    /// Decode a raw payload using `tag` for timestamp recognition
    pub fn decode(raw: RawDocPayload, tag: &DateTag) -> Self {
        let data = if raw.exists {
            raw.data
                .iter()
                .map(|(key, value)| (key.clone(), decode_top_level(key, value, tag)))
                .collect()
        } else {
            raw.data
                .iter()
                .map(|(key, value)| (key.clone(), FieldValue::from(value.clone())))
                .collect()
        };

        Self { raw, data }
    }

    /// Decode straight from a bridge payload
    pub fn from_payload(payload: serde_json::Value, tag: &DateTag) -> Result<Self, FirebaseError> {
        let raw: RawDocPayload = serde_json::from_value(payload)?;
        Ok(Self::decode(raw, tag))
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.raw.exists
    }

    /// Get document ID
    pub fn id(&self) -> &str {
        &self.raw.id
    }

    /// Opaque native reference handle
    pub fn reference(&self) -> &serde_json::Value {
        &self.raw.reference
    }

    /// All decoded fields
    pub fn data(&self) -> &MapValue {
        &self.data
    }

    /// Get a field value by dotted path, e.g. `address.city`
    pub fn get(&self, field_path: &str) -> Option<&FieldValue> {
        get_field(&self.data, field_path)
    }

    /// Payload this snapshot was decoded from
    pub fn raw(&self) -> &RawDocPayload {
        &self.raw
    }

    /// Snapshot metadata is not carried over the bridge
    pub fn metadata(&self) -> Result<Infallible, FirebaseError> {
        Err(FirestoreError::unsupported("DocumentSnapshot.metadata").into())
    }
}

fn decode_top_level(key: &str, value: &serde_json::Value, tag: &DateTag) -> FieldValue {
    let serde_json::Value::String(s) = value else {
        return FieldValue::from(value.clone());
    };
    match tag.decode(s) {
        None => FieldValue::String(s.clone()),
        Some(Ok(timestamp)) => FieldValue::Timestamp(timestamp),
        Some(Err(e)) => {
            warn!(field = key, error = %e, "leaving malformed timestamp tag as string");
            FieldValue::String(s.clone())
        }
    }
}
