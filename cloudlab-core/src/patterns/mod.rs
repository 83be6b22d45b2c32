//! Pattern evaluation — ten independent signal streams from bars + frames.
//!
//! The evaluator is stateless across bars: the signal at bar `i` is a pure
//! function of bars/frames `i-2..=i` (one more bar back in onset mode).
//! Bars inside the warm-up horizon always read `Signal::None`.

pub mod rules;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, PatternId, Signal};
use crate::indicators::IndicatorFrame;

pub use rules::{bounce, cross, PatternContext, Rule, MODERATE_TREND, RULES, STRONG_TREND};

/// When a holding predicate turns into an emitted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Emit only on the bar where the predicate starts to hold.
    #[default]
    Onset,
    /// Emit on every bar where the predicate holds.
    Level,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternEvaluator {
    trigger: Trigger,
}

impl PatternEvaluator {
    pub fn new(trigger: Trigger) -> Self {
        Self { trigger }
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Predicate value at bar `i`, with warm-up and undefined inputs mapped to `None`.
    fn holds(&self, pattern: PatternId, ctx: &PatternContext<'_>, i: usize) -> Signal {
        if !ctx.frames[i].warm {
            return Signal::None;
        }
        RULES[pattern.index()](ctx, i).unwrap_or(Signal::None)
    }

    /// Signal emitted by `pattern` at bar `i`.
    pub fn evaluate_bar(&self, pattern: PatternId, ctx: &PatternContext<'_>, i: usize) -> Signal {
        let current = self.holds(pattern, ctx, i);
        match self.trigger {
            Trigger::Level => current,
            Trigger::Onset => {
                if current.is_none() || (i > 0 && self.holds(pattern, ctx, i - 1) == current) {
                    Signal::None
                } else {
                    current
                }
            }
        }
    }

    /// Evaluate one pattern over every bar.
    pub fn evaluate_pattern(&self, pattern: PatternId, ctx: &PatternContext<'_>) -> Vec<Signal> {
        (0..ctx.len())
            .map(|i| self.evaluate_bar(pattern, ctx, i))
            .collect()
    }

    /// Evaluate all ten patterns over every bar.
    pub fn evaluate(&self, bars: &[Bar], frames: &[IndicatorFrame]) -> SignalTable {
        let ctx = PatternContext::new(bars, frames);
        let columns = PatternId::all()
            .map(|id| self.evaluate_pattern(id, &ctx))
            .collect();
        SignalTable {
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            columns,
        }
    }
}

/// Column-major table of signals: one column per pattern, one row per bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalTable {
    pub timestamps: Vec<NaiveDateTime>,
    columns: Vec<Vec<Signal>>,
}

impl SignalTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Signal stream for one pattern. Empty when the table holds no column
    /// for it (a default or hand-built table).
    pub fn column(&self, pattern: PatternId) -> &[Signal] {
        self.columns
            .get(pattern.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Signal of one pattern at bar `i`; `Signal::None` outside the table.
    pub fn signal(&self, pattern: PatternId, i: usize) -> Signal {
        self.column(pattern).get(i).copied().unwrap_or(Signal::None)
    }

    /// Integer codes (+1/-1/0) for all ten patterns at bar `i`.
    pub fn row_codes(&self, i: usize) -> [i8; PatternId::COUNT] {
        let mut codes = [0i8; PatternId::COUNT];
        for (slot, id) in codes.iter_mut().zip(PatternId::all()) {
            *slot = self.signal(id, i).code();
        }
        codes
    }

    /// Number of non-`None` signals emitted by a pattern.
    pub fn count(&self, pattern: PatternId) -> usize {
        self.column(pattern).iter().filter(|s| !s.is_none()).count()
    }
}
