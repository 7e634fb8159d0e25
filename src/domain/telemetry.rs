// Telemetry domain models - serial readings and timestamped samples
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

const TEMPERATURE_MARKER: &str = "TEMP:";
const CURRENT_MARKER: &str = "CURR:";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("expected 2 comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("field {index} does not start with {expected:?}")]
    WrongMarker { index: usize, expected: &'static str },
    #[error("field {index} has a non-numeric value {value:?}")]
    InvalidNumber { index: usize, value: String },
    #[error("field {index} is not a finite number")]
    NonFinite { index: usize },
}

/// One temperature/current pair as reported by the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub temperature: f64,
    pub current: f64,
}

impl Reading {
    pub fn new(temperature: f64, current: f64) -> Self {
        Self {
            temperature,
            current,
        }
    }

    /// Stamp the reading with the elapsed time at which it was accepted.
    pub fn at(self, timestamp: f64) -> Sample {
        Sample {
            timestamp,
            temperature: self.temperature,
            current: self.current,
        }
    }
}

impl FromStr for Reading {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_reading(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Seconds since the dashboard started.
    pub timestamp: f64,
    pub temperature: f64,
    pub current: f64,
}

/// Parse a `TEMP:<float>,CURR:<float>` line.
///
/// Trailing whitespace is stripped first. Anything else that deviates from
/// the format (other markers, field order, extra or missing commas,
/// non-numeric or non-finite values) is rejected.
pub fn parse_reading(line: &str) -> Result<Reading, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 2 {
        return Err(ParseError::FieldCount(fields.len()));
    }

    let temperature = parse_field(fields[0], 0, TEMPERATURE_MARKER)?;
    let current = parse_field(fields[1], 1, CURRENT_MARKER)?;

    Ok(Reading::new(temperature, current))
}

fn parse_field(field: &str, index: usize, marker: &'static str) -> Result<f64, ParseError> {
    let raw = field
        .trim()
        .strip_prefix(marker)
        .ok_or(ParseError::WrongMarker {
            index,
            expected: marker,
        })?
        .trim();

    let value: f64 = raw.parse().map_err(|_| ParseError::InvalidNumber {
        index,
        value: raw.to_string(),
    })?;

    if !value.is_finite() {
        return Err(ParseError::NonFinite { index });
    }

    Ok(value)
}
