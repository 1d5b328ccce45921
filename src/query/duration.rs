//! Duration vocabulary
//!
//! Maps symbolic time units onto the duration literals understood by the
//! query language (`1h`, `30d`, `86400s`, ...). Used for `group by time(..)`
//! buckets and for `past(..)` time windows.

use std::fmt;

/// Named time units with a fixed literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hour,
    Minute,
    Second,
    Millisecond,
    Day,
    Week,
    /// Approximated as 30 days
    Month,
}

impl TimeUnit {
    /// Duration literal for one unit
    pub fn literal(&self) -> &'static str {
        match self {
            Self::Hour => "1h",
            Self::Minute => "1m",
            Self::Second => "1s",
            Self::Millisecond => "1u",
            Self::Day => "1d",
            Self::Week => "1w",
            Self::Month => "30d",
        }
    }

    /// Parse a symbolic unit name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hour" => Some(Self::Hour),
            "minute" => Some(Self::Minute),
            "second" => Some(Self::Second),
            "ms" | "millisecond" => Some(Self::Millisecond),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

/// A duration as accepted by `time(..)` and `past(..)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval {
    /// One of the predefined units
    Unit(TimeUnit),
    /// Any other unit suffix, rendered as one of that unit (`s` -> `1s`)
    Suffix(String),
    /// A raw literal passed through verbatim (`"4d"`)
    Literal(String),
    /// A number of seconds
    Seconds(u64),
}

impl Interval {
    /// Resolve a symbolic unit name.
    ///
    /// Known names map through [`TimeUnit`]; anything else is treated as a
    /// unit suffix of one.
    pub fn symbol(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match TimeUnit::from_name(name) {
            Some(unit) => Self::Unit(unit),
            None => Self::Suffix(name.to_string()),
        }
    }

    /// Duration literal for the query text
    pub fn resolve(&self) -> String {
        match self {
            Self::Unit(unit) => unit.literal().to_string(),
            Self::Suffix(suffix) => format!("1{}", suffix),
            Self::Literal(raw) => raw.clone(),
            Self::Seconds(secs) => format!("{}s", secs),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resolve())
    }
}

impl From<TimeUnit> for Interval {
    fn from(unit: TimeUnit) -> Self {
        Self::Unit(unit)
    }
}

impl From<&str> for Interval {
    fn from(raw: &str) -> Self {
        Self::Literal(raw.to_string())
    }
}

impl From<String> for Interval {
    fn from(raw: String) -> Self {
        Self::Literal(raw)
    }
}

impl From<u64> for Interval {
    fn from(secs: u64) -> Self {
        Self::Seconds(secs)
    }
}

impl From<std::time::Duration> for Interval {
    fn from(duration: std::time::Duration) -> Self {
        Self::Seconds(duration.as_secs())
    }
}

impl From<chrono::Duration> for Interval {
    fn from(duration: chrono::Duration) -> Self {
        Self::Seconds(duration.num_seconds().max(0) as u64)
    }
}

/// Resolve anything convertible into an [`Interval`] to its literal
pub fn resolve(interval: impl Into<Interval>) -> String {
    interval.into().resolve()
}
