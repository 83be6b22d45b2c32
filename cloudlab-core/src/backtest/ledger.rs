//! Per-pattern ledgers and the bar loop that fills them.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::simulator::TradeSimulator;
use super::tracker::{PositionTracker, TrackerEvent};
use crate::domain::{Bar, PatternId, PriceSeries, Signal, Trade};
use crate::patterns::SignalTable;

/// Append-only record of everything one pattern did during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLedger {
    pub pattern: PatternId,
    pub trades: Vec<Trade>,
    /// Non-`None` signals emitted.
    pub signals: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    /// Signals dropped because a position was already open.
    pub skipped: usize,
    /// Signals accepted but with no minute data to resolve them.
    pub unresolved: usize,
}

impl PatternLedger {
    pub fn new(pattern: PatternId) -> Self {
        Self {
            pattern,
            trades: Vec::new(),
            signals: 0,
            buy_signals: 0,
            sell_signals: 0,
            skipped: 0,
            unresolved: 0,
        }
    }

    pub fn record(&mut self, signal: Signal, event: TrackerEvent) {
        match signal {
            Signal::Buy => self.buy_signals += 1,
            Signal::Sell => self.sell_signals += 1,
            Signal::None => return,
        }
        self.signals += 1;
        match event {
            TrackerEvent::Entered(trade) => self.trades.push(trade),
            TrackerEvent::Skipped => self.skipped += 1,
            TrackerEvent::Unresolved => self.unresolved += 1,
            TrackerEvent::Idle => {}
        }
    }
}

/// Replays signal streams through one tracker per pattern.
#[derive(Debug, Clone, Copy)]
pub struct Backtest {
    simulator: TradeSimulator,
    /// Signal bar duration; entries happen at the signal bar's close.
    entry_offset: Duration,
}

impl Backtest {
    pub fn new(simulator: TradeSimulator, entry_offset: Duration) -> Self {
        Self {
            simulator,
            entry_offset,
        }
    }

    pub fn simulator(&self) -> &TradeSimulator {
        &self.simulator
    }

    /// Run one pattern's stream.
    ///
    /// # Panics
    ///
    /// Panics if `signals` does not align 1:1 with `bars`.
    pub fn run_pattern(
        &self,
        pattern: PatternId,
        bars: &[Bar],
        signals: &[Signal],
        minutes: &PriceSeries,
    ) -> PatternLedger {
        assert_eq!(bars.len(), signals.len(), "signal stream must align with bars");
        let mut tracker = PositionTracker::new(pattern, self.entry_offset);
        let mut ledger = PatternLedger::new(pattern);
        for (bar, &signal) in bars.iter().zip(signals) {
            let event = tracker.on_bar(bar, signal, &self.simulator, minutes);
            ledger.record(signal, event);
        }
        ledger
    }

    /// Run all ten patterns bar by bar, each with its own tracker.
    ///
    /// Rows missing from `table` count as no signal.
    pub fn run_all(
        &self,
        bars: &[Bar],
        table: &SignalTable,
        minutes: &PriceSeries,
    ) -> BTreeMap<PatternId, PatternLedger> {
        let mut trackers: BTreeMap<PatternId, PositionTracker> = PatternId::all()
            .map(|id| (id, PositionTracker::new(id, self.entry_offset)))
            .collect();
        let mut ledgers: BTreeMap<PatternId, PatternLedger> =
            PatternId::all().map(|id| (id, PatternLedger::new(id))).collect();

        for (i, bar) in bars.iter().enumerate() {
            for (id, tracker) in trackers.iter_mut() {
                let signal = table.signal(*id, i);
                let event = tracker.on_bar(bar, signal, &self.simulator, minutes);
                if let Some(ledger) = ledgers.get_mut(id) {
                    ledger.record(signal, event);
                }
            }
        }
        ledgers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::simulator::SimulatorConfig;
    use crate::indicators::{compute_frames, make_bars, IndicatorParams};
    use crate::patterns::PatternEvaluator;

    fn minute_feed(bars: &[Bar]) -> PriceSeries {
        PriceSeries::new(bars.to_vec()).unwrap()
    }

    #[test]
    fn ledger_counts_by_event() {
        let id = PatternId::new(3).unwrap();
        let mut ledger = PatternLedger::new(id);
        ledger.record(Signal::None, TrackerEvent::Idle);
        ledger.record(Signal::Buy, TrackerEvent::Skipped);
        ledger.record(Signal::Sell, TrackerEvent::Unresolved);
        assert_eq!(ledger.signals, 2);
        assert_eq!(ledger.buy_signals, 1);
        assert_eq!(ledger.sell_signals, 1);
        assert_eq!(ledger.skipped, 1);
        assert_eq!(ledger.unresolved, 1);
        assert!(ledger.trades.is_empty());
    }

    #[test]
    fn run_pattern_and_run_all_agree() {
        let closes: Vec<f64> = (0..260)
            .map(|i| 100.0 + (i as f64 * 0.07).sin() * 6.0 + (i as f64 * 0.31).cos() * 1.5)
            .collect();
        let bars = make_bars(&closes);
        let frames = compute_frames(&bars, &IndicatorParams::default());
        let table = PatternEvaluator::default().evaluate(&bars, &frames);
        let minutes = minute_feed(&bars);

        let backtest = Backtest::new(
            TradeSimulator::new(SimulatorConfig {
                max_holding_minutes: 15,
                ..SimulatorConfig::default()
            }),
            Duration::minutes(1),
        );
        let all = backtest.run_all(&bars, &table, &minutes);
        assert_eq!(all.len(), PatternId::COUNT);
        for id in PatternId::all() {
            let single = backtest.run_pattern(id, &bars, table.column(id), &minutes);
            assert_eq!(all[&id], single);
            assert_eq!(single.signals, table.count(id));
            assert_eq!(
                single.signals,
                single.trades.len() + single.skipped + single.unresolved
            );
        }
    }

    #[test]
    fn trades_never_overlap() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + (i as f64 * 0.2).sin() * 4.0).collect();
        let bars = make_bars(&closes);
        let frames = compute_frames(&bars, &IndicatorParams::default());
        let table = PatternEvaluator::new(crate::patterns::Trigger::Level).evaluate(&bars, &frames);
        let minutes = minute_feed(&bars);
        let backtest = Backtest::new(TradeSimulator::default(), Duration::minutes(1));

        for ledger in backtest.run_all(&bars, &table, &minutes).values() {
            for pair in ledger.trades.windows(2) {
                assert!(pair[1].signal_time >= pair[0].exit_time);
            }
        }
    }

    #[test]
    fn run_all_treats_missing_table_rows_as_silent() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let minutes = minute_feed(&bars);
        let backtest = Backtest::new(TradeSimulator::default(), Duration::minutes(1));
        let ledgers = backtest.run_all(&bars, &SignalTable::default(), &minutes);
        assert_eq!(ledgers.len(), PatternId::COUNT);
        for ledger in ledgers.values() {
            assert_eq!(ledger.signals, 0);
            assert!(ledger.trades.is_empty());
        }
    }

    #[test]
    #[should_panic(expected = "signal stream must align with bars")]
    fn run_pattern_rejects_misaligned_stream() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let minutes = minute_feed(&bars);
        let backtest = Backtest::new(TradeSimulator::default(), Duration::minutes(1));
        backtest.run_pattern(PatternId::new(0).unwrap(), &bars, &[Signal::Buy], &minutes);
    }

}
