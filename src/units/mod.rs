//! Unit-value types: byte sizes and time durations.
//!
//! Both types keep the literal they were parsed from, a floating point
//! magnitude and a unit. Arithmetic always goes through the canonical base
//! unit (bytes, nanoseconds); the canonical accessors truncate toward zero.

pub mod byte_size;
pub mod time_duration;

pub use byte_size::{ByteSize, ByteUnit};
pub use time_duration::{TimeDuration, TimeUnit};

use regex::Regex;
use thiserror::Error;

/// Failure to decode a unit-value literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// Text does not have the `<number><unit>` shape at all.
    #[error("invalid {kind} format: '{text}'")]
    Format { kind: &'static str, text: String },

    /// Shape matched, but the unit suffix is not a known unit.
    #[error("unrecognized {kind} unit '{unit}' in '{text}'")]
    UnrecognizedUnit {
        kind: &'static str,
        unit: String,
        text: String,
    },
}

/// Loose `<number><letters>` shape used to tell a bad unit apart from a
/// malformed literal once the strict pattern has rejected the text.
fn unit_literal_shape() -> &'static Regex {
    static SHAPE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
        Regex::new(r"^\s*\d+(\.\d+)?\s*([A-Za-z]+)\s*$").expect("static regex")
    });
    &SHAPE
}

/// Split a literal into magnitude and unit suffix using `strict`, falling
/// back to the loose shape to report `UnrecognizedUnit`.
pub(crate) fn split_literal<'t>(
    strict: &Regex,
    kind: &'static str,
    text: &'t str,
) -> Result<(f64, &'t str), UnitError> {
    if let Some(caps) = strict.captures(text) {
        let magnitude = caps[1].parse::<f64>().map_err(|_| UnitError::Format {
            kind,
            text: text.to_string(),
        })?;
        let unit = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        return Ok((magnitude, unit));
    }

    match unit_literal_shape().captures(text) {
        Some(caps) => Err(UnitError::UnrecognizedUnit {
            kind,
            unit: caps[2].to_string(),
            text: text.to_string(),
        }),
        None => Err(UnitError::Format {
            kind,
            text: text.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_split_literal_shapes() {
        let strict = Regex::new(r"(?i)^\s*(\d+(\.\d+)?)\s*(KB|B)\s*$").unwrap();
        assert_eq!(split_literal(&strict, "byte size", "10KB").unwrap(), (10.0, "KB"));
        assert_eq!(split_literal(&strict, "byte size", " 1.5 b ").unwrap(), (1.5, "b"));

        let err = split_literal(&strict, "byte size", "100XB").unwrap_err();
        assert!(matches!(err, UnitError::UnrecognizedUnit { ref unit, .. } if unit == "XB"));

        let err = split_literal(&strict, "byte size", "abc KB").unwrap_err();
        assert!(matches!(err, UnitError::Format { .. }));

        let err = split_literal(&strict, "byte size", "100").unwrap_err();
        assert!(matches!(err, UnitError::Format { .. }));
    }

    #[test]
    fn test_units_error_display() {
        let err = UnitError::UnrecognizedUnit {
            kind: "time duration",
            unit: "x".to_string(),
            text: "100x".to_string(),
        };
        assert_eq!(err.to_string(), "unrecognized time duration unit 'x' in '100x'");
    }
}
