//! Bar — one time-stamped OHLC observation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC bar for a single period (one minute, or one resampled period).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Returns true if every OHLC field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// Midpoint of the bar's range.
    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

/// Input-shape defects that make a series unusable.
///
/// These are fatal at ingestion: a series containing any of them is refused
/// rather than silently repaired.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index} at {timestamp} has a non-finite price")]
    NonFinitePrice {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("bar {index} duplicates timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("bar {index} at {timestamp} is earlier than the previous bar at {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },
}
