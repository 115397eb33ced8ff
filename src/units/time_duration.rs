//! Time durations (`ns`, `ms`, `s`, `m`, `h`, `d`).

use super::{split_literal, UnitError};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

const KIND: &str = "time duration";

static TIME_DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(\.\d+)?)\s*(ns|ms|s|m|h|d)\s*$").expect("static regex")
});

// ============================================================================
// TimeUnit
// ============================================================================

/// Time unit. Canonical base is the nanosecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeUnit {
    Nanoseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// All units, smallest first.
    pub const ALL: [TimeUnit; 6] = [
        Self::Nanoseconds,
        Self::Milliseconds,
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::Days,
    ];

    /// Suffix spelling used in literals and serialized tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }

    /// Nanoseconds in one of this unit.
    pub fn nanos(self) -> u64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Milliseconds => 1_000_000,
            Self::Seconds => 1_000_000_000,
            Self::Minutes => 60 * 1_000_000_000,
            Self::Hours => 60 * 60 * 1_000_000_000,
            Self::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }

    /// Case-insensitive lookup by suffix.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(name))
    }

    /// Convert `value` expressed in this unit into `target`.
    pub fn convert(self, value: f64, target: TimeUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.nanos() as f64 / target.nanos() as f64
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
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
// TimeDuration
// ============================================================================

/// An immutable duration such as `50ms` or `1.5h`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDuration {
    original: String,
    value: f64,
    unit: TimeUnit,
}

impl TimeDuration {
    /// Parse a literal like `"10ms"`, `"2.5 M"`.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let (value, unit) = split_literal(&TIME_DURATION_PATTERN, KIND, text)?;
        let unit = TimeUnit::from_name(unit).ok_or_else(|| UnitError::UnrecognizedUnit {
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

    /// Like [`TimeDuration::parse`], but `None` or blank input yields `Ok(None)`.
    pub fn parse_optional(text: Option<&str>) -> Result<Option<Self>, UnitError> {
        match text {
            Some(t) if !t.trim().is_empty() => Self::parse(t).map(Some),
            _ => Ok(None),
        }
    }

    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self {
            original: format!("{}{}", value, unit),
            value,
            unit,
        }
    }

    /// Build from a canonical nanosecond count.
    pub fn from_nanos(nanos: u64) -> Self {
        Self::new(nanos as f64, TimeUnit::Nanoseconds)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(millis as f64, TimeUnit::Milliseconds)
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Canonical nanosecond count, truncated toward zero.
    pub fn nanos(&self) -> u64 {
        (self.value * self.unit.nanos() as f64) as u64
    }

    /// Whole milliseconds (truncated).
    pub fn millis(&self) -> u64 {
        self.nanos() / TimeUnit::Milliseconds.nanos()
    }

    /// Whole seconds (truncated).
    pub fn seconds(&self) -> u64 {
        self.nanos() / TimeUnit::Seconds.nanos()
    }

    /// Magnitude expressed in `target`. Same unit returns the stored value.
    pub fn convert_to(&self, target: TimeUnit) -> f64 {
        self.unit.convert(self.value, target)
    }

    /// New instance expressed in `target`; identity when the unit matches.
    pub fn to(&self, target: TimeUnit) -> Self {
        if self.unit == target {
            return self.clone();
        }
        Self::new(self.convert_to(target), target)
    }

    /// Fixed-point rendering, e.g. `format(1)` on `2.5m` gives `2.5m`.
    pub fn format(&self, precision: usize) -> String {
        format!("{:.*}{}", precision, self.value, self.unit)
    }

    /// Truncated canonical value as a [`std::time::Duration`].
    pub fn as_std(&self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.nanos())
    }
}

impl fmt::Display for TimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for TimeDuration {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_duration_parsing() {
        let t = TimeDuration::parse("10ms").unwrap();
        assert_eq!(t.nanos(), 10_000_000);
        assert_eq!(t.unit(), TimeUnit::Milliseconds);

        let t = TimeDuration::parse("1.5s").unwrap();
        assert_eq!(t.nanos(), 1_500_000_000);
        assert_eq!(t.millis(), 1500);

        let t = TimeDuration::parse("2m").unwrap();
        assert_eq!(t.seconds(), 120);

        let t = TimeDuration::parse("1h").unwrap();
        assert_eq!(t.seconds(), 3600);

        let t = TimeDuration::parse("1d").unwrap();
        assert_eq!(t.seconds(), 86_400);

        let t = TimeDuration::parse("250ns").unwrap();
        assert_eq!(t.nanos(), 250);
    }

    #[test]
    fn test_time_duration_case_insensitive() {
        let a = TimeDuration::parse("10MS").unwrap();
        let b = TimeDuration::parse("10ms").unwrap();
        let c = TimeDuration::parse("10 Ms").unwrap();
        assert_eq!(a.nanos(), b.nanos());
        assert_eq!(b.nanos(), c.nanos());
        assert_eq!(a.unit(), TimeUnit::Milliseconds);
    }

    #[test]
    fn test_time_duration_rejects_bad_literals() {
        assert!(matches!(TimeDuration::parse("100"), Err(UnitError::Format { .. })));
        assert!(matches!(
            TimeDuration::parse("100x"),
            Err(UnitError::UnrecognizedUnit { .. })
        ));
        assert!(matches!(
            TimeDuration::parse("abc ms"),
            Err(UnitError::Format { .. })
        ));
    }

    #[test]
    fn test_time_duration_conversions() {
        let t = TimeDuration::parse("90s").unwrap();
        assert_eq!(t.convert_to(TimeUnit::Minutes), 1.5);
        assert_eq!(t.convert_to(TimeUnit::Milliseconds), 90_000.0);
        assert_eq!(t.convert_to(TimeUnit::Seconds), 90.0);

        let m = t.to(TimeUnit::Minutes);
        assert_eq!(m.unit(), TimeUnit::Minutes);
        assert_eq!(m.value(), 1.5);
        assert_eq!(t.to(TimeUnit::Seconds), t);
    }

    #[test]
    fn test_time_duration_from_canonical() {
        let t = TimeDuration::from_nanos(1_500_000_000);
        assert_eq!(t.unit(), TimeUnit::Nanoseconds);
        assert_eq!(t.to(TimeUnit::Seconds).value(), 1.5);
        assert_eq!(TimeDuration::from_millis(250).nanos(), 250_000_000);
    }

    #[test]
    fn test_time_duration_parse_optional() {
        assert_eq!(TimeDuration::parse_optional(None).unwrap(), None);
        assert_eq!(TimeDuration::parse_optional(Some(" ")).unwrap(), None);
        assert!(TimeDuration::parse_optional(Some("5m")).unwrap().is_some());
        assert!(TimeDuration::parse_optional(Some("5w")).is_err());
    }

    #[test]
    fn test_time_duration_format() {
        let t = TimeDuration::parse("2.5m").unwrap();
        assert_eq!(t.format(1), "2.5m");
        assert_eq!(t.format(3), "2.500m");
        assert_eq!(t.to_string(), "2.5m");
    }

    #[test]
    fn test_time_duration_as_std() {
        let t = TimeDuration::parse("1.25s").unwrap();
        assert_eq!(t.as_std(), std::time::Duration::from_millis(1250));
    }

    #[test]
    fn test_time_unit_factor_chain() {
        let ratios = [1_000_000, 1000, 60, 60, 24];
        for (pair, ratio) in TimeUnit::ALL.windows(2).zip(ratios) {
            assert_eq!(pair[1].nanos(), pair[0].nanos() * ratio);
        }
    }
}
