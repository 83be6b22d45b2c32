//! Signal values, trade sides and the fixed set of pattern identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-bar output of one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    None,
}

impl Signal {
    /// Integer code used in signal tables: +1 buy, -1 sell, 0 none.
    pub fn code(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::None => 0,
        }
    }

    pub fn from_code(code: i8) -> Self {
        match code.signum() {
            1 => Signal::Buy,
            -1 => Signal::Sell,
            _ => Signal::None,
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, Signal::None)
    }

    /// The position side this signal would open, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Long),
            Signal::Sell => Some(Side::Short),
            Signal::None => None,
        }
    }
}

/// Direction of an open position or completed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// One of the ten pattern slots (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PatternId(u8);

impl PatternId {
    pub const COUNT: usize = 10;

    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Self(index))
    }

    /// All ten patterns in ascending order.
    pub fn all() -> impl Iterator<Item = PatternId> {
        (0..Self::COUNT as u8).map(PatternId)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Human-readable pattern name for reports.
    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "Price / Leading-A Crossover",
            1 => "Conversion / Base Crossover",
            2 => "Cloud Twist (Leading A / B)",
            3 => "Bounce at Leading A",
            4 => "Lagging Line Confirmation",
            5 => "Bounce at Conversion Line",
            6 => "Price / Base Crossover",
            7 => "Bounce at Leading B",
            8 => "Price Above/Below Cloud",
            _ => "Lagging Line vs Cloud",
        }
    }
}

impl TryFrom<u8> for PatternId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PatternId::new(value).ok_or_else(|| format!("pattern id {value} out of range 0-9"))
    }
}

impl From<PatternId> for u8 {
    fn from(id: PatternId) -> Self {
        id.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern_{}", self.0)
    }
}
