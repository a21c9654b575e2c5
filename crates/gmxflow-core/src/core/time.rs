use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Integration timestep of the production run, in picoseconds (2 fs).
pub const TIMESTEP_PS: f64 = 0.002;

/// Number of integration steps per nanosecond at [`TIMESTEP_PS`].
const STEPS_PER_NS: f64 = 1000.0 / TIMESTEP_PS;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TimeParseError {
    #[error("Missing numeric value in duration '{0}'. Expected '<number><unit>' (e.g., '10ns').")]
    MissingValue(String),

    #[error("Missing time unit in duration '{0}'. Expected one of: ns, ps, us, ms.")]
    MissingUnit(String),

    #[error("Unknown time unit '{unit}' in duration '{input}'. Expected one of: ns, ps, us, ms.")]
    UnknownUnit { input: String, unit: String },

    #[error("Invalid numeric value in duration '{0}'.")]
    InvalidValue(String),

    #[error("Duration '{0}' must be positive.")]
    NonPositive(String),
}

/// Time units accepted for the simulation duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Picoseconds,
    Nanoseconds,
    Microseconds,
    Milliseconds,
}

impl TimeUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ps" => Some(Self::Picoseconds),
            "ns" => Some(Self::Nanoseconds),
            "us" => Some(Self::Microseconds),
            "ms" => Some(Self::Milliseconds),
            _ => None,
        }
    }

    /// Conversion factor from one of this unit to nanoseconds.
    pub fn nanoseconds_per_unit(&self) -> f64 {
        match self {
            Self::Picoseconds => 1e-3,
            Self::Nanoseconds => 1.0,
            Self::Microseconds => 1e3,
            Self::Milliseconds => 1e6,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Picoseconds => "ps",
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
        }
    }
}

/// A simulation duration as entered by the user, e.g. `10ns` or `500ps`.
///
/// Stored as the original value/unit pair so that log output can echo the
/// user's wording; all arithmetic goes through [`Self::as_nanoseconds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationTime {
    value: f64,
    unit: TimeUnit,
}

impl SimulationTime {
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub fn from_nanoseconds(ns: f64) -> Self {
        Self::new(ns, TimeUnit::Nanoseconds)
    }

    pub fn as_nanoseconds(&self) -> f64 {
        self.value * self.unit.nanoseconds_per_unit()
    }

    /// Number of integration steps for the production run at a 2 fs timestep.
    pub fn production_steps(&self) -> u64 {
        (self.as_nanoseconds() * STEPS_PER_NS).round() as u64
    }
}

impl fmt::Display for SimulationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for SimulationTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| TimeParseError::MissingUnit(trimmed.to_string()))?;

        let (number, suffix) = trimmed.split_at(split);
        if number.is_empty() {
            return Err(TimeParseError::MissingValue(trimmed.to_string()));
        }

        let value: f64 = number
            .parse()
            .map_err(|_| TimeParseError::InvalidValue(trimmed.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(TimeParseError::NonPositive(trimmed.to_string()));
        }

        let unit = TimeUnit::from_suffix(suffix).ok_or_else(|| TimeParseError::UnknownUnit {
            input: trimmed.to_string(),
            unit: suffix.to_string(),
        })?;

        Ok(Self { value, unit })
    }
}
