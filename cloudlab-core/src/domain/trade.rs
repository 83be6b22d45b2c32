//! Trade — the realized outcome of one accepted entry.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal::{PatternId, Side};

/// Why a trade closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Timeout,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "STOP_LOSS"),
            ExitReason::TakeProfit => write!(f, "TAKE_PROFIT"),
            ExitReason::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// A completed round-trip: accepted signal → resolved exit.
///
/// Built once by the trade simulator and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub pattern: PatternId,
    pub side: Side,

    // ── Entry ──
    /// Open time of the bar that produced the signal.
    pub signal_time: NaiveDateTime,
    /// Close time of the signal bar; the minute walk starts here.
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Size & PnL ──
    pub quantity: f64,
    pub gross_pnl: f64,
    pub fees: f64,
    pub pnl: f64,
    /// Net PnL as a fraction of entry notional.
    pub return_pct: f64,

    // ── Excursion ──
    /// Best side-adjusted move seen during the walk, as a fraction of entry.
    pub max_favorable_pct: f64,
    /// Worst side-adjusted move seen during the walk (<= 0).
    pub max_adverse_pct: f64,
    pub profitable_minutes: usize,
    pub losing_minutes: usize,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn holding_minutes(&self) -> i64 {
        (self.exit_time - self.entry_time).num_minutes()
    }
}
