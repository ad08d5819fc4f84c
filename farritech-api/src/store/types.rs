//! Typed documents and the Firestore value codec.

use std::collections::BTreeMap;

use serde_json::{json, Map};
use time::Date;

use crate::util::dates::parse_date;

/// Field name to value mapping, ordered so encoded requests are stable.
pub type Fields = BTreeMap<String, Value>;

/// A typed document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    /// RFC 3339 timestamp, kept as text
    Timestamp(String),
    Array(Vec<Value>),
    Map(Fields),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Encode in Firestore's tagged wire form, e.g. `{"stringValue": "x"}`.
    pub fn to_firestore(&self) -> serde_json::Value {
        match self {
            Value::String(s) => json!({ "stringValue": s }),
            Value::Boolean(b) => json!({ "booleanValue": b }),
            // int64 travels as a decimal string
            Value::Integer(i) => json!({ "integerValue": i.to_string() }),
            Value::Double(d) => json!({ "doubleValue": d }),
            Value::Timestamp(t) => json!({ "timestampValue": t }),
            Value::Array(items) => {
                let values: Vec<_> = items.iter().map(Value::to_firestore).collect();
                json!({ "arrayValue": { "values": values } })
            }
            Value::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
            Value::Null => json!({ "nullValue": null }),
        }
    }

    /// Decode Firestore's tagged wire form. Unsupported tags yield `None`.
    pub fn from_firestore(raw: &serde_json::Value) -> Option<Value> {
        let obj = raw.as_object()?;
        let (tag, inner) = obj.iter().next()?;

        match tag.as_str() {
            "stringValue" => inner.as_str().map(|s| Value::String(s.to_string())),
            "booleanValue" => inner.as_bool().map(Value::Boolean),
            "integerValue" => match inner {
                serde_json::Value::String(s) => s.parse().ok().map(Value::Integer),
                other => other.as_i64().map(Value::Integer),
            },
            "doubleValue" => inner.as_f64().map(Value::Double),
            "timestampValue" => inner.as_str().map(|s| Value::Timestamp(s.to_string())),
            "nullValue" => Some(Value::Null),
            "arrayValue" => {
                let values = inner
                    .get("values")
                    .and_then(|v| v.as_array())
                    .map(|items| items.iter().filter_map(Value::from_firestore).collect())
                    .unwrap_or_default();
                Some(Value::Array(values))
            }
            "mapValue" => Some(Value::Map(
                inner.get("fields").map(decode_fields).unwrap_or_default(),
            )),
            _ => None,
        }
    }

    /// Plain JSON rendering for API responses.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) | Value::Timestamp(s) => json!(s),
            Value::Boolean(b) => json!(b),
            Value::Integer(i) => json!(i),
            Value::Double(d) => json!(d),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(fields) => fields_to_json(fields),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

pub fn encode_fields(fields: &Fields) -> serde_json::Value {
    let map: Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), v.to_firestore()))
        .collect();
    serde_json::Value::Object(map)
}

pub fn decode_fields(raw: &serde_json::Value) -> Fields {
    raw.as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| Value::from_firestore(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}

fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

/// A stored document: its full resource name plus typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Full resource name, e.g. `projects/p/databases/(default)/documents/customers/abc`
    pub name: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// The last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// A non-empty string field. Missing, empty and non-string fields are all `None`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Calendar date of a string or timestamp field.
    pub fn get_date(&self, field: &str) -> Option<Date> {
        match self.fields.get(field)? {
            Value::String(s) | Value::Timestamp(s) => parse_date(s),
            _ => None,
        }
    }

    /// Missing, null, or an empty string.
    pub fn is_blank(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) | Some(Value::Timestamp(s)) => s.trim().is_empty(),
            Some(_) => false,
        }
    }

    /// Decode a Firestore `Document` resource.
    pub fn from_firestore(raw: &serde_json::Value) -> Option<Document> {
        let name = raw.get("name")?.as_str()?.to_string();
        let fields = raw.get("fields").map(decode_fields).unwrap_or_default();
        Some(Document { name, fields })
    }

    /// Flatten to plain JSON with the document id under `id`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = match fields_to_json(&self.fields) {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        };
        obj.insert("id".to_string(), json!(self.id()));
        serde_json::Value::Object(obj)
    }
}

/// An equality filter on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}
