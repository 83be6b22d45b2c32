//! Integration tests for the runner: CSV feeds on disk through to saved artifacts.
//!
//! Minute feeds are generated into a temp directory, so every test runs the
//! same path the CLI does: load → resample → signals → simulate → export.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use cloudlab_core::domain::{ExitReason, PatternId, Side};
use cloudlab_runner::config::BacktestConfig;
use cloudlab_runner::export::{load_artifacts, save_artifacts};
use cloudlab_runner::runner::run_single_backtest;

fn session_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
}

/// Write a one-minute CSV feed where each bar opens at the previous close.
fn write_minutes(dir: &Path, closes: &[f64]) -> PathBuf {
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for (i, &close) in closes.iter().enumerate() {
        let open = if i == 0 { close } else { closes[i - 1] };
        let ts = session_start() + Duration::minutes(i as i64);
        writeln!(
            csv,
            "{},{open},{},{},{close},100",
            ts.format("%Y-%m-%d %H:%M:%S"),
            open.max(close) + 0.2,
            open.min(close) - 0.2,
        )
        .unwrap();
    }
    let path = dir.join("minutes.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

fn config(name: &str, timeframe: &str) -> BacktestConfig {
    BacktestConfig::from_toml(&format!(
        r#"
[backtest]
name = "{name}"
symbol = "TEST"
timeframe = "{timeframe}"
start_date = "2024-01-01"
end_date = "2024-01-31"
"#
    ))
    .unwrap()
}

fn uptrend(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64 * 0.1).collect()
}

fn wave(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.004).sin() * 6.0 + (t * 0.05).sin() * 0.8
        })
        .collect()
}

#[test]
fn uptrend_takes_profit_on_cloud_breakout() {
    let dir = tempfile::tempdir().unwrap();
    let minutes = write_minutes(dir.path(), &uptrend(300));
    let result = run_single_backtest(&config("uptrend", "1min"), &minutes, None).unwrap();

    assert_eq!(result.bar_count, 300);
    assert_eq!(result.minute_count, 300);

    let breakout = PatternId::new(8).unwrap();
    let summary = &result.patterns[breakout.index()];
    assert!(summary.trades >= 1, "expected a breakout trade: {summary:?}");
    assert_eq!(summary.sell_signals, 0);

    let trade = result
        .trades
        .iter()
        .find(|t| t.pattern == breakout)
        .unwrap();
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
    assert!(trade.pnl > 0.0);
    assert_eq!(trade.entry_time, trade.signal_time + Duration::minutes(1));
}

#[test]
fn five_minute_run_respects_exit_rules() {
    let dir = tempfile::tempdir().unwrap();
    let minutes = write_minutes(dir.path(), &wave(4000));
    let cfg = config("wave_5min", "5min");
    let result = run_single_backtest(&cfg, &minutes, None).unwrap();

    assert_eq!(result.minute_count, 4000);
    assert_eq!(result.bar_count, 800);
    assert_eq!(result.patterns.len(), PatternId::COUNT);
    assert_eq!(result.totals.total_trades, result.trades.len());

    let b = &cfg.backtest;
    for t in &result.trades {
        assert_eq!(t.entry_time, t.signal_time + Duration::minutes(5));
        assert!(t.holding_minutes() <= b.max_holding_minutes);
        let ret = t.side.sign() * (t.exit_price - t.entry_price) / t.entry_price;
        match t.exit_reason {
            ExitReason::StopLoss => assert!(ret <= -b.stop_loss_pct + 1e-9),
            ExitReason::TakeProfit => assert!(ret >= b.take_profit_pct - 1e-9),
            ExitReason::Timeout => {}
        }
    }

    for id in PatternId::all() {
        let trades: Vec<_> = result.trades.iter().filter(|t| t.pattern == id).collect();
        for pair in trades.windows(2) {
            assert!(
                pair[1].entry_time > pair[0].exit_time,
                "{id}: trades overlap"
            );
        }
        let s = &result.patterns[id.index()];
        assert_eq!(s.trades, trades.len());
        assert_eq!(s.total_signals, s.trades + s.skipped + s.unresolved);
    }
}

#[test]
fn explicit_bar_file_matches_resampled_feed() {
    let dir = tempfile::tempdir().unwrap();
    let minutes = write_minutes(dir.path(), &wave(1500));
    let cfg = config("explicit_bars", "1min");

    let resampled = run_single_backtest(&cfg, &minutes, None).unwrap();
    let explicit = run_single_backtest(&cfg, &minutes, Some(&minutes)).unwrap();
    assert_eq!(resampled, explicit);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let minutes = write_minutes(dir.path(), &wave(2000));
    let result = run_single_backtest(&config("artifacts", "5min"), &minutes, None).unwrap();

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&result, &out).unwrap();
    assert_eq!(run_dir, out.join("artifacts"));

    let trades_csv = std::fs::read_to_string(run_dir.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), 1 + result.trades.len());
    let summary_csv = std::fs::read_to_string(run_dir.join("pattern_summary.csv")).unwrap();
    assert_eq!(summary_csv.lines().count(), 1 + PatternId::COUNT);

    let reloaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(reloaded.run_id, result.run_id);
    assert_eq!(reloaded.trades.len(), result.trades.len());
    assert_eq!(reloaded.totals.total_trades, result.totals.total_trades);
}

#[test]
fn missing_minute_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    assert!(run_single_backtest(&config("missing", "1min"), &missing, None).is_err());
}

#[test]
fn rows_outside_date_range_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let minutes = write_minutes(dir.path(), &uptrend(120));
    let text = r#"
[backtest]
symbol = "TEST"
start_date = "2024-02-01"
end_date = "2024-02-28"
"#;
    let cfg = BacktestConfig::from_toml(text).unwrap();
    let result = run_single_backtest(&cfg, &minutes, None).unwrap();
    assert_eq!(result.bar_count, 0);
    assert!(result.trades.is_empty());
    assert_eq!(result.totals.total_signals, 0);
}
