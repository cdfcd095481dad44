//! Measured durations tagged with their unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Unit a measured duration is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Seconds
    Seconds,
    /// Milliseconds
    #[default]
    Milliseconds,
    /// Microseconds
    Microseconds,
    /// Nanoseconds
    Nanoseconds,
}

impl TimeUnit {
    /// How many of this unit fit in one second.
    pub fn per_second(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1_000.0,
            TimeUnit::Microseconds => 1_000_000.0,
            TimeUnit::Nanoseconds => 1_000_000_000.0,
        }
    }

    /// Short suffix used when displaying values.
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
        }
    }
}

/// An immutable measured duration.
///
/// Converting between units multiplies the stored value; nothing is
/// re-measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Elapsed {
    value: f64,
    unit: TimeUnit,
}

impl Elapsed {
    /// A zero-length duration in the given unit.
    pub fn zero(unit: TimeUnit) -> Self {
        Self { value: 0.0, unit }
    }

    /// Create a duration. Negative or NaN values are clamped to zero.
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        let value = if value.is_nan() || value < 0.0 { 0.0 } else { value };
        Self { value, unit }
    }

    /// Create a duration from a number of seconds, expressed in `unit`.
    pub fn from_secs_f64(seconds: f64, unit: TimeUnit) -> Self {
        Self::new(seconds, TimeUnit::Seconds).to(unit)
    }

    /// Numeric value in [`Elapsed::unit`].
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Unit of [`Elapsed::value`].
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Express this duration in another unit.
    pub fn to(self, unit: TimeUnit) -> Self {
        if unit == self.unit {
            return self;
        }
        Self {
            value: self.value * unit.per_second() / self.unit.per_second(),
            unit,
        }
    }

    /// Value in seconds.
    pub fn as_secs(&self) -> f64 {
        self.to(TimeUnit::Seconds).value
    }

    /// Value in milliseconds.
    pub fn as_millis(&self) -> f64 {
        self.to(TimeUnit::Milliseconds).value
    }

    /// Value in microseconds.
    pub fn as_micros(&self) -> f64 {
        self.to(TimeUnit::Microseconds).value
    }

    /// Value in nanoseconds.
    pub fn as_nanos(&self) -> f64 {
        self.to(TimeUnit::Nanoseconds).value
    }

    /// Convert to a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.as_secs()).unwrap_or(Duration::MAX)
    }
}

impl Default for Elapsed {
    fn default() -> Self {
        Self::zero(TimeUnit::default())
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}{}", self.value, self.unit.suffix())
    }
}
