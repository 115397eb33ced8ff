//! Byte sizes with binary (1024-based) units.

use super::{split_literal, UnitError};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

const KIND: &str = "byte size";

static BYTE_SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(\.\d+)?)\s*(B|KB|MB|GB|TB|PB|EB|ZB|YB)\s*$").expect("static regex")
});

// ============================================================================
// ByteUnit
// ============================================================================

/// Byte unit. Each step multiplies the previous factor by 1024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ByteUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
    EB,
    ZB,
    YB,
}

impl ByteUnit {
    /// All units, smallest first.
    pub const ALL: [ByteUnit; 9] = [
        Self::B,
        Self::KB,
        Self::MB,
        Self::GB,
        Self::TB,
        Self::PB,
        Self::EB,
        Self::ZB,
        Self::YB,
    ];

    /// Canonical spelling (`B`, `KB`, ... `YB`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
            Self::PB => "PB",
            Self::EB => "EB",
            Self::ZB => "ZB",
            Self::YB => "YB",
        }
    }

    /// Number of bytes in one of this unit. Powers of two are exact in f64,
    /// including the ZB and YB factors that overflow `u64`.
    pub fn factor(self) -> f64 {
        let exponent = self as i32;
        1024f64.powi(exponent)
    }

    /// Case-insensitive lookup by spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Convert `value` expressed in this unit into `target`.
    pub fn convert(self, value: f64, target: ByteUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.factor() / target.factor()
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnitError::UnrecognizedUnit {
            kind: KIND,
            unit: s.to_string(),
            text: s.to_string(),
        })
    }
}

// ============================================================================
// ByteSize
// ============================================================================

/// An immutable byte size such as `10KB` or `1.5MB`.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteSize {
    original: String,
    value: f64,
    unit: ByteUnit,
}

impl ByteSize {
    /// Parse a literal like `"10KB"`, `"1.5 mb"`.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let (value, unit) = split_literal(&BYTE_SIZE_PATTERN, KIND, text)?;
        let unit = ByteUnit::from_name(unit).ok_or_else(|| UnitError::UnrecognizedUnit {
            kind: KIND,
            unit: unit.to_string(),
            text: text.to_string(),
        })?;
        Ok(Self {
            original: text.to_string(),
            value,
            unit,
        })
    }

    /// Like [`ByteSize::parse`], but `None` or blank input yields `Ok(None)`.
    pub fn parse_optional(text: Option<&str>) -> Result<Option<Self>, UnitError> {
        match text {
            Some(t) if !t.trim().is_empty() => Self::parse(t).map(Some),
            _ => Ok(None),
        }
    }

    /// Build from a decoded magnitude and unit.
    pub fn new(value: f64, unit: ByteUnit) -> Self {
        Self {
            original: format!("{}{}", value, unit),
            value,
            unit,
        }
    }

    /// Build from a canonical byte count.
    pub fn from_bytes(bytes: u64) -> Self {
        Self::new(bytes as f64, ByteUnit::B)
    }

    /// Text this value was produced from.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Magnitude in [`ByteSize::unit`].
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> ByteUnit {
        self.unit
    }

    /// Canonical byte count, truncated toward zero (saturates at `u64::MAX`).
    pub fn bytes(&self) -> u64 {
        (self.value * self.unit.factor()) as u64
    }

    /// Magnitude expressed in `target`. Same unit returns the stored value.
    pub fn convert_to(&self, target: ByteUnit) -> f64 {
        self.unit.convert(self.value, target)
    }

    /// New instance expressed in `target`; identity when the unit matches.
    pub fn to(&self, target: ByteUnit) -> Self {
        if self.unit == target {
            return self.clone();
        }
        Self::new(self.convert_to(target), target)
    }

    /// Fixed-point rendering, e.g. `format(2)` on `10.5MB` gives `10.50MB`.
    pub fn format(&self, precision: usize) -> String {
        format!("{:.*}{}", precision, self.value, self.unit)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for ByteSize {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
