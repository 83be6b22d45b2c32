//! Trade simulator — resolves one accepted entry against the minute feed.
//!
//! Walks the one-minute closes from the entry time up to `max_holding`
//! minutes later. The first minute whose side-adjusted move breaches the
//! stop closes the trade as `StopLoss`; otherwise the first minute reaching
//! the target closes it as `TakeProfit`. The stop is checked first, so a
//! minute that satisfies both resolves as a loss. If neither fires the trade
//! times out at the last minute in the window.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, PatternId, PriceSeries, Side, Trade};

/// Exit and sizing parameters shared by all patterns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Adverse move (fraction of entry) that closes the trade.
    pub stop_loss_pct: f64,
    /// Favourable move (fraction of entry) that closes the trade.
    pub take_profit_pct: f64,
    pub max_holding_minutes: i64,
    pub initial_capital: f64,
    /// Fraction of capital committed per trade.
    pub position_size: f64,
    /// Fixed unit count; overrides `position_size` when set.
    pub quantity: Option<f64>,
    /// Fraction of notional charged on each leg.
    pub transaction_cost: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.01,
            take_profit_pct: 0.015,
            max_holding_minutes: 60,
            initial_capital: 100_000.0,
            position_size: 0.1,
            quantity: None,
            transaction_cost: 0.0,
        }
    }
}

impl SimulatorConfig {
    /// Holding window as a duration, `None` when it does not fit one.
    pub fn max_holding(&self) -> Option<Duration> {
        Duration::try_minutes(self.max_holding_minutes)
    }

    /// Units bought or sold for an entry at `entry_price`.
    pub fn quantity_at(&self, entry_price: f64) -> f64 {
        match self.quantity {
            Some(q) => q,
            None => self.position_size * self.initial_capital / entry_price,
        }
    }
}

/// An accepted signal waiting to be resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRequest {
    pub pattern: PatternId,
    pub side: Side,
    pub signal_time: NaiveDateTime,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TradeSimulator {
    config: SimulatorConfig,
}

impl TradeSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Resolve an entry against the minute feed.
    ///
    /// Returns `None` when the feed has no minutes in the holding window, the
    /// entry price cannot size a position, or the window end is past the
    /// representable calendar.
    pub fn simulate(&self, entry: &EntryRequest, minutes: &PriceSeries) -> Option<Trade> {
        let cfg = &self.config;
        if entry.entry_price <= 0.0 {
            return None;
        }
        let window_end = cfg
            .max_holding()
            .and_then(|holding| entry.entry_time.checked_add_signed(holding))?;
        let window = minutes.window(entry.entry_time, window_end);
        let last = window.last()?;

        let sign = entry.side.sign();
        let mut max_favorable: f64 = 0.0;
        let mut max_adverse: f64 = 0.0;
        let mut profitable_minutes = 0;
        let mut losing_minutes = 0;
        let mut exit = (last.timestamp, last.close, ExitReason::Timeout);

        for minute in window {
            let change = (minute.close - entry.entry_price) / entry.entry_price * sign;
            max_favorable = max_favorable.max(change);
            max_adverse = max_adverse.min(change);
            if change > 0.0 {
                profitable_minutes += 1;
            } else if change < 0.0 {
                losing_minutes += 1;
            }

            if change <= -cfg.stop_loss_pct {
                exit = (minute.timestamp, minute.close, ExitReason::StopLoss);
                break;
            }
            if change >= cfg.take_profit_pct {
                exit = (minute.timestamp, minute.close, ExitReason::TakeProfit);
                break;
            }
        }

        let (exit_time, exit_price, exit_reason) = exit;
        let quantity = cfg.quantity_at(entry.entry_price);
        let entry_notional = quantity * entry.entry_price;
        let exit_notional = quantity * exit_price;
        let gross_pnl = (exit_price - entry.entry_price) * quantity * sign;
        let fees = cfg.transaction_cost * (entry_notional + exit_notional);
        let pnl = gross_pnl - fees;

        Some(Trade {
            pattern: entry.pattern,
            side: entry.side,
            signal_time: entry.signal_time,
            entry_time: entry.entry_time,
            entry_price: entry.entry_price,
            exit_time,
            exit_price,
            exit_reason,
            quantity,
            gross_pnl,
            fees,
            pnl,
            return_pct: pnl / entry_notional,
            max_favorable_pct: max_favorable,
            max_adverse_pct: max_adverse,
            profitable_minutes,
            losing_minutes,
        })
    }
}
