//! Backtest runner — wires together data loading, the core engine and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads CSV data, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded series. No I/O.
//!
//! Patterns are independent, so each one runs on its own rayon task with
//! its own tracker. Results are re-ordered by pattern id afterwards.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use cloudlab_core::backtest::{Backtest, PatternLedger, TradeSimulator};
use cloudlab_core::domain::{PatternId, PriceSeries, Timeframe, Trade};
use cloudlab_core::indicators::{compute_frames, IndicatorFrame, IndicatorParams};
use cloudlab_core::patterns::{PatternEvaluator, SignalTable, Trigger};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars_csv, resample, LoadError};
use crate::metrics::{PatternSummary, RunTotals};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub name: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub trigger: Trigger,
    pub start_date: String,
    pub end_date: String,
    pub initial_capital: f64,
    pub bar_count: usize,
    pub minute_count: usize,
    pub warmup_bars: usize,
    pub totals: RunTotals,
    /// One entry per pattern, ordered by pattern id.
    pub patterns: Vec<PatternSummary>,
    /// All trades, ordered by pattern id then entry time.
    pub trades: Vec<Trade>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Indicator frames and the signal table for one bar series.
pub fn generate_signals(
    bars: &PriceSeries,
    params: &IndicatorParams,
    trigger: Trigger,
) -> (Vec<IndicatorFrame>, SignalTable) {
    let frames = compute_frames(bars.bars(), params);
    let table = PatternEvaluator::new(trigger).evaluate(bars.bars(), &frames);
    (frames, table)
}

/// Load data per the config and run the backtest.
///
/// Signal bars come from `bars_path` when given; otherwise the minute feed
/// is resampled to the configured timeframe.
pub fn run_single_backtest(
    config: &BacktestConfig,
    minutes_path: &Path,
    bars_path: Option<&Path>,
) -> Result<BacktestResult, RunError> {
    let range = Some(config.time_range());
    let minutes = load_bars_csv(minutes_path, range)?;
    info!(path = %minutes_path.display(), minutes = minutes.len(), "loaded minute feed");

    let bars = match bars_path {
        Some(path) => {
            let bars = load_bars_csv(path, range)?;
            info!(path = %path.display(), bars = bars.len(), "loaded signal bars");
            bars
        }
        None => {
            let bars = resample(&minutes, config.backtest.timeframe)?;
            info!(timeframe = %config.backtest.timeframe, bars = bars.len(), "resampled minute feed");
            bars
        }
    };

    run_backtest_from_data(config, &bars, &minutes)
}

/// Run a backtest on pre-loaded series. Does no I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    bars: &PriceSeries,
    minutes: &PriceSeries,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let b = &config.backtest;
    let warmup = config.indicators.warmup_bars();
    if bars.len() <= warmup {
        warn!(bars = bars.len(), warmup, "series shorter than warm-up, no signals possible");
    }

    let (_, table) = generate_signals(bars, &config.indicators, config.signals.trigger);
    info!(bars = table.len(), trigger = ?config.signals.trigger, "evaluated patterns");

    let backtest = Backtest::new(
        TradeSimulator::new(config.simulator_config()),
        b.timeframe.duration(),
    );
    let mut ledgers: Vec<PatternLedger> = PatternId::all()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|id| backtest.run_pattern(id, bars.bars(), table.column(id), minutes))
        .collect();
    ledgers.sort_by_key(|l| l.pattern);

    for ledger in &ledgers {
        debug!(
            pattern = %ledger.pattern,
            signals = ledger.signals,
            trades = ledger.trades.len(),
            skipped = ledger.skipped,
            "pattern finished"
        );
        if ledger.unresolved > 0 {
            warn!(
                pattern = %ledger.pattern,
                unresolved = ledger.unresolved,
                "signals without minute data to resolve them"
            );
        }
    }

    let patterns: Vec<PatternSummary> = ledgers
        .iter()
        .map(|l| PatternSummary::compute(l, b.initial_capital))
        .collect();
    let totals = RunTotals::compute(&patterns);
    info!(
        trades = totals.total_trades,
        pnl = totals.total_pnl,
        win_rate = totals.win_rate,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        name: b.name.clone(),
        symbol: b.symbol.clone(),
        timeframe: b.timeframe,
        trigger: config.signals.trigger,
        start_date: b.start_date.to_string(),
        end_date: b.end_date.to_string(),
        initial_capital: b.initial_capital,
        bar_count: bars.len(),
        minute_count: minutes.len(),
        warmup_bars: warmup,
        totals,
        patterns,
        trades: ledgers.into_iter().flat_map(|l| l.trades).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use cloudlab_core::domain::Bar;

    fn config(timeframe: &str) -> BacktestConfig {
        BacktestConfig::from_toml(&format!(
            r#"
[backtest]
name = "unit"
symbol = "TEST"
timeframe = "{timeframe}"
start_date = "2024-01-01"
end_date = "2024-12-31"
"#
        ))
        .unwrap()
    }

    fn minutes(closes: impl Iterator<Item = f64>) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        let mut prev = None;
        let bars = closes
            .enumerate()
            .map(|(i, c)| {
                let open = prev.unwrap_or(c);
                prev = Some(c);
                Bar::new(start + Duration::minutes(i as i64), open, open.max(c) + 0.2, open.min(c) - 0.2, c)
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn flat_series_yields_zero_metrics() {
        let feed = minutes(std::iter::repeat(100.0).take(200));
        let result = run_backtest_from_data(&config("1min"), &feed, &feed).unwrap();
        assert_eq!(result.patterns.len(), PatternId::COUNT);
        assert!(result.trades.is_empty());
        for s in &result.patterns {
            assert_eq!(s.trades, 0);
            assert_eq!(s.win_rate, 0.0);
        }
        assert_eq!(result.totals.win_rate, 0.0);
    }

    #[test]
    fn patterns_ordered_by_id() {
        let feed = minutes((0..600).map(|i| 100.0 + (i as f64 * 0.05).sin() * 5.0));
        let result = run_backtest_from_data(&config("1min"), &feed, &feed).unwrap();
        let ids: Vec<PatternId> = result.patterns.iter().map(|s| s.pattern).collect();
        assert_eq!(ids, PatternId::all().collect::<Vec<_>>());
        for pair in result.trades.windows(2) {
            assert!(pair[0].pattern <= pair[1].pattern);
        }
    }

    #[test]
    fn oversized_holding_window_is_rejected_before_running() {
        let feed = minutes((0..300).map(|i| 100.0 + i as f64 * 0.1));
        let mut cfg = config("1min");
        cfg.backtest.max_holding_minutes = 1_000_000_000_000;
        let err = run_backtest_from_data(&cfg, &feed, &feed).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn parallel_run_is_deterministic() {
        let feed = minutes((0..800).map(|i| 100.0 + (i as f64 * 0.03).sin() * 8.0));
        let five = resample(&feed, "5min".parse().unwrap()).unwrap();
        let cfg = config("5min");
        let a = run_backtest_from_data(&cfg, &five, &feed).unwrap();
        let b = run_backtest_from_data(&cfg, &five, &feed).unwrap();
        assert_eq!(a, b);
    }
}
