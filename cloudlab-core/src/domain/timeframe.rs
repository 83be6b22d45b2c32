//! Timeframe — the period label a bar series was sampled at.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timeframe '{0}' (expected e.g. 1min, 5min, 1h, 1d)")]
pub struct TimeframeError(pub String);

/// A bar period in whole minutes.
///
/// Parsed from labels such as `"1min"`, `"15min"`, `"1h"`, `"1d"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    minutes: u32,
}

impl Timeframe {
    pub const ONE_MINUTE: Timeframe = Timeframe { minutes: 1 };

    pub fn from_minutes(minutes: u32) -> Result<Self, TimeframeError> {
        if minutes == 0 {
            return Err(TimeframeError("0min".into()));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::ONE_MINUTE
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        let (digits, unit_minutes) = if let Some(n) = label.strip_suffix("min") {
            (n, 1)
        } else if let Some(n) = label.strip_suffix('t') {
            // pandas-style offset alias, e.g. "5T"
            (n, 1)
        } else if let Some(n) = label.strip_suffix('h') {
            (n, 60)
        } else if let Some(n) = label.strip_suffix('d') {
            (n, 60 * 24)
        } else {
            return Err(TimeframeError(s.to_string()));
        };

        let count: u32 = digits
            .parse()
            .map_err(|_| TimeframeError(s.to_string()))?;
        count
            .checked_mul(unit_minutes)
            .filter(|m| *m > 0)
            .map(|minutes| Self { minutes })
            .ok_or_else(|| TimeframeError(s.to_string()))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes % (60 * 24) == 0 {
            write!(f, "{}d", self.minutes / (60 * 24))
        } else if self.minutes % 60 == 0 {
            write!(f, "{}h", self.minutes / 60)
        } else {
            write!(f, "{}min", self.minutes)
        }
    }
}
