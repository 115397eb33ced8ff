//! Rows and dynamically-typed column values.

use crate::units::{ByteSize, TimeDuration, UnitError};
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// A column value. `Raw` holds undecoded source text; every other variant
/// is already decoded. Unit values are resolved lazily at the point of use.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Raw(String),
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    ByteSize(ByteSize),
    TimeDuration(TimeDuration),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Raw(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Decode as a byte size. `Ok(None)` when the value is absent; any
    /// other non-byte-size value is parsed from its text rendering.
    pub fn to_byte_size(&self) -> Result<Option<ByteSize>, UnitError> {
        match self {
            Self::Null => Ok(None),
            Self::ByteSize(b) => Ok(Some(b.clone())),
            Self::Raw(s) | Self::Text(s) => ByteSize::parse(s).map(Some),
            other => ByteSize::parse(&other.to_string()).map(Some),
        }
    }

    /// Decode as a time duration, same rules as [`Value::to_byte_size`].
    pub fn to_time_duration(&self) -> Result<Option<TimeDuration>, UnitError> {
        match self {
            Self::Null => Ok(None),
            Self::TimeDuration(t) => Ok(Some(t.clone())),
            Self::Raw(s) | Self::Text(s) => TimeDuration::parse(s).map(Some),
            other => TimeDuration::parse(&other.to_string()).map(Some),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Raw(s) | Self::Text(s) => JsonValue::String(s.clone()),
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::ByteSize(b) => JsonValue::String(b.original().to_string()),
            Self::TimeDuration(t) => JsonValue::String(t.original().to_string()),
        }
    }
}

/// JSON input: strings stay raw, nested structures keep their JSON text.
impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Raw(n.to_string()), Self::Float),
            },
            JsonValue::String(s) => Self::Raw(s.clone()),
            other => Self::Raw(other.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<ByteSize> for Value {
    fn from(b: ByteSize) -> Self {
        Self::ByteSize(b)
    }
}

impl From<TimeDuration> for Value {
    fn from(t: TimeDuration) -> Self {
        Self::TimeDuration(t)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Raw(s) | Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::ByteSize(b) => write!(f, "{}", b),
            Self::TimeDuration(t) => write!(f, "{}", t),
        }
    }
}

// ============================================================================
// Row
// ============================================================================

/// Ordered mapping from column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Row::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a column. An existing column keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Value of `name`, treating a missing column as [`Value::Null`].
    pub fn value(&self, name: &str) -> &Value {
        self.columns.get(name).unwrap_or(&Value::Null)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.columns.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .columns
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        JsonValue::Object(map)
    }

    /// Build a row from a JSON object.
    pub fn from_json(json: &JsonValue) -> Result<Self, String> {
        let object = json
            .as_object()
            .ok_or_else(|| format!("row must be a JSON object, got {}", json))?;
        Ok(Self {
            columns: object
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v)))
                .collect(),
        })
    }
}
