//! PriceSeries — an ordered, validated run of bars.
//!
//! Construction is the only place bars are checked. Once built, a series is
//! read-only and every downstream component may assume strictly ascending,
//! duplicate-free timestamps and finite prices.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::bar::{Bar, BarError};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Validate and wrap a bar vector.
    ///
    /// Gaps between timestamps are allowed; going backwards or repeating a
    /// timestamp is not.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_finite() {
                return Err(BarError::NonFinitePrice {
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if index == 0 {
                continue;
            }
            let previous = bars[index - 1].timestamp;
            if bar.timestamp == previous {
                return Err(BarError::DuplicateTimestamp {
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if bar.timestamp < previous {
                return Err(BarError::NonMonotonicTimestamp {
                    index,
                    timestamp: bar.timestamp,
                    previous,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Bars whose timestamps fall in `[start, end]` (inclusive both ends).
    pub fn window(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[Bar] {
        if end < start {
            return &[];
        }
        let lo = self.bars.partition_point(|b| b.timestamp < start);
        let hi = self.bars.partition_point(|b| b.timestamp <= end);
        &self.bars[lo..hi]
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
