//! Position tracker — single-position gate for one pattern.
//!
//! While a pattern holds a position, further signals from that pattern are
//! counted as skipped. A position stays open until its exit deadline: the
//! minute after the exit minute for stop/target exits, or
//! `entry_time + max_holding` for timeouts. A bar stamped exactly at the
//! deadline already sees the tracker flat, so its signal is evaluated fresh.

use chrono::Duration;

use super::simulator::{EntryRequest, TradeSimulator};
use crate::domain::{Bar, ExitReason, PatternId, Position, PriceSeries, Signal, Trade};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerState {
    Flat,
    InPosition(Position),
}

/// What the tracker did with one bar.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// No signal on this bar.
    Idle,
    /// Signal accepted and resolved into a trade.
    Entered(Trade),
    /// Signal arrived while a position was open.
    Skipped,
    /// Signal accepted but the minute feed had nothing to resolve it against.
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct PositionTracker {
    pattern: PatternId,
    state: TrackerState,
    /// Delay from the signal bar's timestamp to the entry (the bar's close).
    entry_offset: Duration,
}

impl PositionTracker {
    pub fn new(pattern: PatternId, entry_offset: Duration) -> Self {
        Self {
            pattern,
            state: TrackerState::Flat,
            entry_offset,
        }
    }

    pub fn pattern(&self) -> PatternId {
        self.pattern
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.state, TrackerState::Flat)
    }

    /// Advance the tracker by one signal-timeframe bar.
    ///
    /// Bars must be fed in ascending timestamp order.
    pub fn on_bar(
        &mut self,
        bar: &Bar,
        signal: Signal,
        simulator: &TradeSimulator,
        minutes: &PriceSeries,
    ) -> TrackerEvent {
        if let TrackerState::InPosition(position) = self.state {
            if !position.is_open_at(bar.timestamp) {
                self.state = TrackerState::Flat;
            }
        }

        let Some(side) = signal.side() else {
            return TrackerEvent::Idle;
        };
        if !self.is_flat() {
            return TrackerEvent::Skipped;
        }

        let Some(entry_time) = bar.timestamp.checked_add_signed(self.entry_offset) else {
            return TrackerEvent::Unresolved;
        };
        let request = EntryRequest {
            pattern: self.pattern,
            side,
            signal_time: bar.timestamp,
            entry_time,
            entry_price: bar.close,
        };
        let Some(trade) = simulator.simulate(&request, minutes) else {
            return TrackerEvent::Unresolved;
        };

        // The exit minute itself still belongs to the closed position.
        let deadline = match trade.exit_reason {
            ExitReason::StopLoss | ExitReason::TakeProfit => {
                trade.exit_time.checked_add_signed(Duration::minutes(1))
            }
            ExitReason::Timeout => simulator
                .config()
                .max_holding()
                .and_then(|holding| trade.entry_time.checked_add_signed(holding)),
        };
        let exit_deadline = deadline.unwrap_or(trade.exit_time);
        self.state = TrackerState::InPosition(Position {
            side,
            entry_time: trade.entry_time,
            entry_price: trade.entry_price,
            exit_deadline,
        });
        TrackerEvent::Entered(trade)
    }
}
