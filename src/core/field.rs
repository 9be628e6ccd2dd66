//! Typed key/value fields attached to log records
//!
//! This module provides:
//! - `FieldValue`: the closed set of payload kinds a field can carry
//! - `Field`: a keyed value, with constructors for every kind
//! - `AggregateField`: types that expose a group of nested fields
//! - `flatten`: replaces aggregate fields with their nested fields

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{self, Write as _};

pub const KEY_NODE: &str = "node";
pub const KEY_SERVICE: &str = "service";
pub const KEY_FUNCTION: &str = "function";
pub const KEY_SOURCE: &str = "source";
pub const KEY_ERROR: &str = "error";

/// Rendering of an error field that carries no error
pub const NIL_ERROR: &str = "<nil>";

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    StringArray(Vec<String>),
    Int(i64),
    Uint(u64),
    Bytes(Vec<u8>),
    Float(f64),
    Time(DateTime<Utc>),
    /// Error message text, `None` when the error is absent
    Error(Option<String>),
    /// Nested fields; never delivered to an output as-is
    Aggregate(Vec<Field>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::StringArray(items) => {
                let json = serde_json::to_string(items).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Uint(u) => write!(f, "{}", u),
            FieldValue::Bytes(bytes) => f.write_str(&encode_hex(bytes)),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            FieldValue::Error(Some(message)) => f.write_str(message),
            FieldValue::Error(None) => f.write_str(NIL_ERROR),
            FieldValue::Aggregate(fields) => {
                let mut first = true;
                for field in fields {
                    if !first {
                        f.write_char(' ')?;
                    }
                    write!(f, "{}={}", field.key, field.value)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::StringArray(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Uint(u) => serde_json::Value::Number((*u).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Aggregate(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|field| (field.key.clone(), field.value.to_json_value()))
                    .collect(),
            ),
            FieldValue::Bytes(_) | FieldValue::Time(_) | FieldValue::Error(_) => {
                serde_json::Value::String(self.to_string())
            }
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::Uint(u)
    }
}

impl From<u32> for FieldValue {
    fn from(u: u32) -> Self {
        FieldValue::Uint(u as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(bytes: Vec<u8>) -> Self {
        FieldValue::Bytes(bytes)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::StringArray(items)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

/// A type that contributes a group of fields to a record
///
/// Implement it for domain objects that should expand into several
/// top-level fields, then attach them with [`Field::from_aggregate`].
pub trait AggregateField {
    fn nested_fields(&self) -> Vec<Field>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    /// Field rendered through the value's `Display` impl
    pub fn display(key: impl Into<String>, value: &dyn fmt::Display) -> Self {
        Self::new(key, FieldValue::String(value.to_string()))
    }

    /// String-array field rendered through each item's `Display` impl
    pub fn display_slice<I, T>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        let items = values.into_iter().map(|v| v.to_string()).collect();
        Self::new(key, FieldValue::StringArray(items))
    }

    pub fn strings(key: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(key, FieldValue::StringArray(values))
    }

    pub fn int(key: impl Into<String>, value: isize) -> Self {
        Self::new(key, FieldValue::Int(value as i64))
    }

    pub fn int32(key: impl Into<String>, value: i32) -> Self {
        Self::new(key, FieldValue::Int(value as i64))
    }

    pub fn int64(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, FieldValue::Int(value))
    }

    pub fn uint(key: impl Into<String>, value: usize) -> Self {
        Self::new(key, FieldValue::Uint(value as u64))
    }

    pub fn uint32(key: impl Into<String>, value: u32) -> Self {
        Self::new(key, FieldValue::Uint(value as u64))
    }

    pub fn uint64(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, FieldValue::Uint(value))
    }

    pub fn float32(key: impl Into<String>, value: f32) -> Self {
        Self::new(key, FieldValue::Float(value as f64))
    }

    pub fn float64(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, FieldValue::Float(value))
    }

    pub fn bytes(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, FieldValue::Bytes(value.into()))
    }

    pub fn timestamp(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, FieldValue::Time(value))
    }

    /// Error field keyed `error`, carrying the error's message text
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::new(KEY_ERROR, FieldValue::Error(Some(err.to_string())))
    }

    /// Error field with no error attached, rendered as `<nil>`
    pub fn nil_error() -> Self {
        Self::new(KEY_ERROR, FieldValue::Error(None))
    }

    pub fn node(value: impl Into<String>) -> Self {
        Self::string(KEY_NODE, value)
    }

    pub fn service(value: impl Into<String>) -> Self {
        Self::string(KEY_SERVICE, value)
    }

    pub fn function(value: impl Into<String>) -> Self {
        Self::string(KEY_FUNCTION, value)
    }

    pub fn source(value: impl Into<String>) -> Self {
        Self::string(KEY_SOURCE, value)
    }

    pub fn aggregate(key: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(key, FieldValue::Aggregate(fields))
    }

    pub fn from_aggregate(key: impl Into<String>, value: &dyn AggregateField) -> Self {
        Self::aggregate(key, value.nested_fields())
    }

    #[inline]
    pub fn is_nested(&self) -> bool {
        matches!(self.value, FieldValue::Aggregate(_))
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.value, FieldValue::Error(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Recursively replace aggregate fields with their nested fields, keeping order
pub fn flatten(fields: impl IntoIterator<Item = Field>) -> Vec<Field> {
    let mut flattened = Vec::new();
    flatten_into(fields, &mut flattened);
    flattened
}

fn flatten_into(fields: impl IntoIterator<Item = Field>, out: &mut Vec<Field>) {
    for field in fields {
        match field.value {
            FieldValue::Aggregate(nested) => flatten_into(nested, out),
            _ => out.push(field),
        }
    }
}

/// Lowercase hex encoding used by every formatter for byte fields
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // writing to a String cannot fail
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Track {
        artist: &'static str,
        song: &'static str,
    }

    impl AggregateField for Track {
        fn nested_fields(&self) -> Vec<Field> {
            vec![
                Field::string("Artist", self.artist),
                Field::string("Song", self.song),
            ]
        }
    }

    #[test]
    fn test_bytes_render_as_lowercase_hex() {
        let field = Field::bytes("payload", vec![1, 2, 3, 99, 250]);
        assert_eq!(field.value.to_string(), "01020363fa");
        assert_eq!(field.value.to_json_value(), "01020363fa");
    }

    #[test]
    fn test_error_fields() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let field = Field::error(&io_err);
        assert_eq!(field.key, KEY_ERROR);
        assert_eq!(field.value.to_string(), "disk on fire");
        assert!(field.is_error());

        assert_eq!(Field::nil_error().value.to_string(), NIL_ERROR);
    }

    #[test]
    fn test_display_slice_collects_strings() {
        let field = Field::display_slice("ids", [1, 2, 3]);
        assert_eq!(
            field.value,
            FieldValue::StringArray(vec!["1".into(), "2".into(), "3".into()])
        );
        assert_eq!(field.value.to_string(), r#"["1","2","3"]"#);
    }

    #[test]
    fn test_float_rendering_is_shortest() {
        assert_eq!(Field::float64("f", 3.0).value.to_string(), "3");
        assert_eq!(Field::float64("f", 0.25).value.to_string(), "0.25");
        assert_eq!(
            Field::float64("nan", f64::NAN).value.to_json_value(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_flatten_recurses_into_aggregates() {
        let track = Track {
            artist: "Iggy Pop",
            song: "Passenger",
        };
        let fields = vec![
            Field::string("k1", "v1"),
            Field::aggregate(
                "outer",
                vec![
                    Field::int("depth", 1),
                    Field::from_aggregate("music", &track),
                ],
            ),
            Field::string("k2", "v2"),
        ];

        let flat = flatten(fields);
        let keys: Vec<&str> = flat.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["k1", "depth", "Artist", "Song", "k2"]);
        assert!(flat.iter().all(|f| !f.is_nested()));
    }
}
