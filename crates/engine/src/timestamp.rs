// Event timestamps and the poll watermark
//
// Decision: Keep the exact numeric token the service sent. The watermark is echoed back in the
// poll URL, and a rounded value would make the service resend the newest event on every poll.

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid timestamp: {0}")]
pub struct InvalidTimestamp(String);

/// A finite JSON number, compared by value and displayed as received
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Timestamp(Number);

impl Timestamp {
    pub fn zero() -> Self {
        Self(Number::from(0))
    }

    fn value(&self) -> f64 {
        self.0.as_f64().unwrap_or(0.0)
    }

    /// Strictly later than `other`
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.value() > other.value()
    }

    /// Numbers and numeric strings; everything else is not a timestamp
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Self::from_number(n.clone()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn from_number(n: Number) -> Option<Self> {
        n.as_f64().map(|_| Self(n))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(Number::from(value))
    }
}

impl FromStr for Timestamp {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Number>()
            .ok()
            .and_then(Self::from_number)
            .ok_or_else(|| InvalidTimestamp(s.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
