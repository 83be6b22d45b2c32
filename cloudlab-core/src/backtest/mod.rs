//! Backtest — per-pattern position gating and minute-level trade resolution.
//!
//! Each pattern owns a `PositionTracker`. On an accepted signal the tracker
//! calls the `TradeSimulator` synchronously; the resulting trade fixes the
//! position's exit deadline before the next bar is looked at.

pub mod ledger;
pub mod simulator;
pub mod tracker;

pub use ledger::{Backtest, PatternLedger};
pub use simulator::{EntryRequest, SimulatorConfig, TradeSimulator};
pub use tracker::{PositionTracker, TrackerEvent, TrackerState};
