//! Firestore field value types
//!
//! Values cross the bridge as plain JSON. [`FieldValue`] is the typed view used
//! by the query builder and the snapshot decoder; the only type the JSON wire
//! cannot express directly is [`Timestamp`].

use super::timestamp::{DateTag, Timestamp};
use chrono::SecondsFormat;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Map of field values, keyed by field name
pub type MapValue = BTreeMap<String, FieldValue>;

/// A single document field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// JSON `null`
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer that fits in `i64`
    Integer(i64),
    /// Any other number
    Double(f64),
    /// String
    String(String),
    /// Point in time, millisecond precision on the wire
    Timestamp(Timestamp),
    /// Ordered list
    Array(Vec<FieldValue>),
    /// Nested mapping
    Map(MapValue),
}

impl FieldValue {
    /// Plain JSON form of this value
    ///
    /// Timestamps become RFC 3339 strings here; only query filters use the
    /// tagged form (see [`FieldValue::to_filter_wire`]).
    pub fn to_wire(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            FieldValue::Null => Json::Null,
            FieldValue::Boolean(b) => Json::Bool(*b),
            FieldValue::Integer(i) => Json::from(*i),
            FieldValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            FieldValue::String(s) => Json::String(s.clone()),
            FieldValue::Timestamp(ts) => Json::String(
                ts.to_datetime()
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            FieldValue::Array(values) => Json::Array(values.iter().map(Self::to_wire).collect()),
            FieldValue::Map(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_wire()))
                    .collect(),
            ),
        }
    }

    /// Wire form of a `where` comparison value
    ///
    /// A top-level timestamp is encoded with `tag`; anything else goes out
    /// exactly as [`FieldValue::to_wire`] would send it.
    pub fn to_filter_wire(&self, tag: &DateTag) -> serde_json::Value {
        match self {
            FieldValue::Timestamp(ts) => serde_json::Value::String(tag.encode(ts)),
            other => other.to_wire(),
        }
    }

    /// Returns true for `null`
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Read as a float; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Read as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Read as a timestamp
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Borrow as a list
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Borrow as a nested mapping
    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            FieldValue::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Walk a dotted field path (`address.city`) through nested maps
pub fn get_field<'a>(fields: &'a MapValue, field_path: &str) -> Option<&'a FieldValue> {
    let mut segments = field_path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

/// Convert raw JSON without any tag decoding
impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => FieldValue::Null,
            Json::Bool(b) => FieldValue::Boolean(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => FieldValue::String(s),
            Json::Array(values) => {
                FieldValue::Array(values.into_iter().map(FieldValue::from).collect())
            }
            Json::Object(fields) => FieldValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(values: Vec<FieldValue>) -> Self {
        FieldValue::Array(values)
    }
}

impl From<MapValue> for FieldValue {
    fn from(fields: MapValue) -> Self {
        FieldValue::Map(fields)
    }
}
