//! Typed tokens produced by the recipe compiler.
//!
//! A token is an immutable, self-identifying value: it knows its
//! [`TokenKind`], renders back to the source text it came from, and
//! describes itself as JSON for recipe introspection tooling. The JSON
//! form (`{type, value}` plus `bytes`/`nanos`/`unit` for unit values)
//! is an external contract and round-trips through [`Token::from_json`].

use crate::units::{ByteSize, TimeDuration};
use indexmap::IndexMap;
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;

// ============================================================================
// LazyNumber
// ============================================================================

/// A numeric literal kept as source text until a consumer asks for a
/// concrete type, so very large literals lose no precision at parse time.
#[derive(Debug, Clone)]
pub struct LazyNumber(String);

impl LazyNumber {
    /// Accept `text` if it denotes a finite number.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(Self(text.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value as `i64` when the literal is integral and in range.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }

    pub fn as_f64(&self) -> f64 {
        // parse() only admits finite floats
        self.0.parse::<f64>().unwrap_or(f64::NAN)
    }

    /// Integer when possible, otherwise a float.
    fn to_json(&self) -> JsonValue {
        if let Some(i) = self.as_i64() {
            return JsonValue::from(i);
        }
        if let Some(u) = self.as_u64() {
            return JsonValue::from(u);
        }
        serde_json::Number::from_f64(self.as_f64())
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(self.0.clone()))
    }

    fn from_json(value: &JsonValue) -> Result<Self, String> {
        match value {
            JsonValue::Number(n) => Self::parse(&n.to_string())
                .ok_or_else(|| format!("numeric value out of range: {}", n)),
            JsonValue::String(s) => {
                Self::parse(s).ok_or_else(|| format!("invalid numeric literal '{}'", s))
            }
            other => Err(format!("expected a number, got {}", other)),
        }
    }
}

/// Numbers compare by value, so `10.50` equals `10.5`.
impl PartialEq for LazyNumber {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_i64(), other.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl From<i64> for LazyNumber {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl fmt::Display for LazyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `low:high=label` entry of a [`Token::Ranges`] token.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericRange {
    pub low: LazyNumber,
    pub high: LazyNumber,
    pub label: String,
}

// ============================================================================
// TokenKind
// ============================================================================

/// Discriminant of [`Token`], used by usage schemas for type checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    DirectiveName,
    ColumnName,
    ColumnNameList,
    Text,
    TextList,
    Numeric,
    NumericList,
    Bool,
    BoolList,
    Properties,
    Ranges,
    Expression,
    ByteSize,
    TimeDuration,
}

impl TokenKind {
    pub const ALL: [TokenKind; 15] = [
        Self::Identifier,
        Self::DirectiveName,
        Self::ColumnName,
        Self::ColumnNameList,
        Self::Text,
        Self::TextList,
        Self::Numeric,
        Self::NumericList,
        Self::Bool,
        Self::BoolList,
        Self::Properties,
        Self::Ranges,
        Self::Expression,
        Self::ByteSize,
        Self::TimeDuration,
    ];

    /// Serialized `type` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "IDENTIFIER",
            Self::DirectiveName => "DIRECTIVE_NAME",
            Self::ColumnName => "COLUMN_NAME",
            Self::ColumnNameList => "COLUMN_NAME_LIST",
            Self::Text => "TEXT",
            Self::TextList => "TEXT_LIST",
            Self::Numeric => "NUMERIC",
            Self::NumericList => "NUMERIC_LIST",
            Self::Bool => "BOOLEAN",
            Self::BoolList => "BOOLEAN_LIST",
            Self::Properties => "PROPERTIES",
            Self::Ranges => "RANGES",
            Self::Expression => "EXPRESSION",
            Self::ByteSize => "BYTE_SIZE",
            Self::TimeDuration => "TIME_DURATION",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Token
// ============================================================================

/// A typed value decoded from one piece of directive source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    DirectiveName(String),
    /// Column reference with the leading `:` stripped.
    ColumnName(String),
    ColumnNameList(Vec<String>),
    /// Quoted text with the quotes stripped.
    Text(String),
    TextList(Vec<String>),
    Numeric(LazyNumber),
    NumericList(Vec<LazyNumber>),
    Bool(bool),
    BoolList(Vec<bool>),
    Properties(IndexMap<String, Token>),
    Ranges(Vec<NumericRange>),
    /// Embedded expression text, opaque to the compiler.
    Expression(String),
    ByteSize(ByteSize),
    TimeDuration(TimeDuration),
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Identifier(_) => TokenKind::Identifier,
            Self::DirectiveName(_) => TokenKind::DirectiveName,
            Self::ColumnName(_) => TokenKind::ColumnName,
            Self::ColumnNameList(_) => TokenKind::ColumnNameList,
            Self::Text(_) => TokenKind::Text,
            Self::TextList(_) => TokenKind::TextList,
            Self::Numeric(_) => TokenKind::Numeric,
            Self::NumericList(_) => TokenKind::NumericList,
            Self::Bool(_) => TokenKind::Bool,
            Self::BoolList(_) => TokenKind::BoolList,
            Self::Properties(_) => TokenKind::Properties,
            Self::Ranges(_) => TokenKind::Ranges,
            Self::Expression(_) => TokenKind::Expression,
            Self::ByteSize(_) => TokenKind::ByteSize,
            Self::TimeDuration(_) => TokenKind::TimeDuration,
        }
    }

    /// Structured self-description: `{type, value}`, plus the canonical
    /// magnitude and resolved unit for byte sizes and durations.
    pub fn to_json(&self) -> JsonValue {
        let kind = self.kind().as_str();
        match self {
            Self::Identifier(s)
            | Self::DirectiveName(s)
            | Self::ColumnName(s)
            | Self::Text(s)
            | Self::Expression(s) => json!({ "type": kind, "value": s }),
            Self::ColumnNameList(v) | Self::TextList(v) => json!({ "type": kind, "value": v }),
            Self::Numeric(n) => json!({ "type": kind, "value": n.to_json() }),
            Self::NumericList(v) => {
                let values: Vec<JsonValue> = v.iter().map(LazyNumber::to_json).collect();
                json!({ "type": kind, "value": values })
            }
            Self::Bool(b) => json!({ "type": kind, "value": b }),
            Self::BoolList(v) => json!({ "type": kind, "value": v }),
            Self::Properties(props) => {
                let map: Map<String, JsonValue> = props
                    .iter()
                    .map(|(k, t)| (k.clone(), t.to_json()))
                    .collect();
                json!({ "type": kind, "value": map })
            }
            Self::Ranges(ranges) => {
                let values: Vec<JsonValue> = ranges
                    .iter()
                    .map(|r| {
                        json!({
                            "low": r.low.to_json(),
                            "high": r.high.to_json(),
                            "label": r.label,
                        })
                    })
                    .collect();
                json!({ "type": kind, "value": values })
            }
            Self::ByteSize(b) => json!({
                "type": kind,
                "value": b.original(),
                "bytes": b.bytes(),
                "unit": b.unit().as_str(),
            }),
            Self::TimeDuration(t) => json!({
                "type": kind,
                "value": t.original(),
                "nanos": t.nanos(),
                "unit": t.unit().as_str(),
            }),
        }
    }

    /// Rebuild a token from its [`Token::to_json`] form.
    pub fn from_json(json: &JsonValue) -> Result<Self, String> {
        let kind_name = json
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or("token is missing its 'type' field")?;
        let kind = TokenKind::from_name(kind_name)
            .ok_or_else(|| format!("unknown token type '{}'", kind_name))?;
        let value = json
            .get("value")
            .ok_or_else(|| format!("{} token is missing its 'value' field", kind))?;

        let token = match kind {
            TokenKind::Identifier => Self::Identifier(json_str(value, kind)?),
            TokenKind::DirectiveName => Self::DirectiveName(json_str(value, kind)?),
            TokenKind::ColumnName => Self::ColumnName(json_str(value, kind)?),
            TokenKind::Text => Self::Text(json_str(value, kind)?),
            TokenKind::Expression => Self::Expression(json_str(value, kind)?),
            TokenKind::ColumnNameList => Self::ColumnNameList(json_list(value, kind, |v| {
                json_str(v, kind)
            })?),
            TokenKind::TextList => Self::TextList(json_list(value, kind, |v| json_str(v, kind))?),
            TokenKind::Numeric => Self::Numeric(LazyNumber::from_json(value)?),
            TokenKind::NumericList => Self::NumericList(json_list(value, kind, LazyNumber::from_json)?),
            TokenKind::Bool => Self::Bool(json_bool(value, kind)?),
            TokenKind::BoolList => Self::BoolList(json_list(value, kind, |v| json_bool(v, kind))?),
            TokenKind::Properties => {
                let map = value
                    .as_object()
                    .ok_or_else(|| format!("{} value must be an object", kind))?;
                let mut props = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    props.insert(k.clone(), Self::from_json(v)?);
                }
                Self::Properties(props)
            }
            TokenKind::Ranges => Self::Ranges(json_list(value, kind, |v| {
                let field = |name: &str| {
                    v.get(name)
                        .ok_or_else(|| format!("range entry is missing '{}'", name))
                };
                Ok(NumericRange {
                    low: LazyNumber::from_json(field("low")?)?,
                    high: LazyNumber::from_json(field("high")?)?,
                    label: json_str(field("label")?, kind)?,
                })
            })?),
            TokenKind::ByteSize => {
                let text = json_str(value, kind)?;
                Self::ByteSize(ByteSize::parse(&text).map_err(|e| e.to_string())?)
            }
            TokenKind::TimeDuration => {
                let text = json_str(value, kind)?;
                Self::TimeDuration(TimeDuration::parse(&text).map_err(|e| e.to_string())?)
            }
        };
        Ok(token)
    }
}

fn json_str(value: &JsonValue, kind: TokenKind) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("{} value must be a string, got {}", kind, value))
}

fn json_bool(value: &JsonValue, kind: TokenKind) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("{} value must be a boolean, got {}", kind, value))
}

fn json_list<T>(
    value: &JsonValue,
    kind: TokenKind,
    item: impl Fn(&JsonValue) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{} value must be an array", kind))?
        .iter()
        .map(item)
        .collect()
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s)
            | Self::DirectiveName(s)
            | Self::ColumnName(s)
            | Self::Text(s)
            | Self::Expression(s) => f.write_str(s),
            Self::ColumnNameList(v) | Self::TextList(v) => f.write_str(&v.join(",")),
            Self::Numeric(n) => write!(f, "{}", n),
            Self::NumericList(v) => {
                let parts: Vec<&str> = v.iter().map(LazyNumber::as_str).collect();
                f.write_str(&parts.join(","))
            }
            Self::Bool(b) => write!(f, "{}", b),
            Self::BoolList(v) => {
                let parts: Vec<String> = v.iter().map(bool::to_string).collect();
                f.write_str(&parts.join(","))
            }
            Self::Properties(props) => {
                let parts: Vec<String> = props.iter().map(|(k, t)| format!("{}={}", k, t)).collect();
                f.write_str(&parts.join(","))
            }
            Self::Ranges(ranges) => {
                let parts: Vec<String> = ranges
                    .iter()
                    .map(|r| format!("{}:{}={}", r.low, r.high, r.label))
                    .collect();
                f.write_str(&parts.join(","))
            }
            Self::ByteSize(b) => write!(f, "{}", b),
            Self::TimeDuration(t) => write!(f, "{}", t),
        }
    }
}
