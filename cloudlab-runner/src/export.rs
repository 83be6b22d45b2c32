//! Export — CSV and JSON artifacts for signal tables and backtest results.
//!
//! A backtest run writes three files under `<output_dir>/<name>/`:
//! - `result.json` — the full `BacktestResult`
//! - `trades.csv` — one row per trade
//! - `pattern_summary.csv` — one row per pattern
//!
//! All persisted JSON includes a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cloudlab_core::domain::{Bar, PatternId, Trade};
use cloudlab_core::indicators::IndicatorFrame;
use cloudlab_core::patterns::SignalTable;

use crate::metrics::PatternSummary;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_default()
}

/// Export bars, indicator columns and the ten pattern columns as CSV.
///
/// Undefined indicator values are written as empty cells.
pub fn export_signals_csv(
    bars: &[Bar],
    frames: &[IndicatorFrame],
    table: &SignalTable,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = [
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "conversion_line",
        "base_line",
        "leading_a",
        "leading_b",
        "lagging_line",
        "plus_di",
        "minus_di",
        "strength",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(PatternId::all().map(|id| id.to_string()));
    wtr.write_record(&header)?;

    for (i, (bar, f)) in bars.iter().zip(frames).enumerate() {
        let mut row = vec![
            bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.6}", bar.open),
            format!("{:.6}", bar.high),
            format!("{:.6}", bar.low),
            format!("{:.6}", bar.close),
            opt(f.conversion_line),
            opt(f.base_line),
            opt(f.leading_a),
            opt(f.leading_b),
            opt(f.lagging_line),
            opt(f.plus_di),
            opt(f.minus_di),
            opt(f.strength),
        ];
        row.extend(table.row_codes(i).iter().map(|c| c.to_string()));
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a trade list as CSV.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "pattern",
        "pattern_name",
        "side",
        "signal_time",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "exit_reason",
        "holding_minutes",
        "quantity",
        "gross_pnl",
        "fees",
        "pnl",
        "return_pct",
        "max_favorable_pct",
        "max_adverse_pct",
        "profitable_minutes",
        "losing_minutes",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.pattern.index().to_string(),
            t.pattern.name(),
            &t.side.to_string(),
            &t.signal_time.format(TIMESTAMP_FORMAT).to_string(),
            &t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", t.exit_price),
            &t.exit_reason.to_string(),
            &t.holding_minutes().to_string(),
            &format!("{:.6}", t.quantity),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.fees),
            &format!("{:.2}", t.pnl),
            &format!("{:.6}", t.return_pct),
            &format!("{:.6}", t.max_favorable_pct),
            &format!("{:.6}", t.max_adverse_pct),
            &t.profitable_minutes.to_string(),
            &t.losing_minutes.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export per-pattern summaries as CSV, one column per summary field.
pub fn export_summary_csv(summaries: &[PatternSummary]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "pattern",
        "pattern_name",
        "total_signals",
        "buy_signals",
        "sell_signals",
        "trades",
        "skipped",
        "unresolved",
        "winners",
        "losers",
        "win_rate",
        "gross_pnl",
        "fees",
        "total_pnl",
        "avg_trade_pnl",
        "best_trade_pnl",
        "worst_trade_pnl",
        "avg_win",
        "avg_loss",
        "total_return",
        "annualized_return",
        "volatility",
        "sharpe",
        "sortino",
        "calmar_ratio",
        "max_drawdown",
        "max_drawdown_pct",
        "profit_factor",
        "recovery_factor",
        "max_consecutive_wins",
        "max_consecutive_losses",
        "trades_per_month",
        "avg_holding_minutes",
        "avg_max_favorable_pct",
        "avg_max_adverse_pct",
        "stop_loss_exits",
        "take_profit_exits",
        "timeout_exits",
        "performance_score",
    ])?;

    for s in summaries {
        wtr.write_record([
            &s.pattern.index().to_string(),
            &s.name,
            &s.total_signals.to_string(),
            &s.buy_signals.to_string(),
            &s.sell_signals.to_string(),
            &s.trades.to_string(),
            &s.skipped.to_string(),
            &s.unresolved.to_string(),
            &s.winners.to_string(),
            &s.losers.to_string(),
            &format!("{:.4}", s.win_rate),
            &format!("{:.2}", s.gross_pnl),
            &format!("{:.2}", s.fees),
            &format!("{:.2}", s.total_pnl),
            &format!("{:.2}", s.avg_trade_pnl),
            &format!("{:.2}", s.best_trade_pnl),
            &format!("{:.2}", s.worst_trade_pnl),
            &format!("{:.2}", s.avg_win),
            &format!("{:.2}", s.avg_loss),
            &format!("{:.6}", s.total_return),
            &format!("{:.6}", s.annualized_return),
            &format!("{:.6}", s.volatility),
            &format!("{:.4}", s.sharpe),
            &format!("{:.4}", s.sortino),
            &format!("{:.4}", s.calmar_ratio),
            &format!("{:.2}", s.max_drawdown),
            &format!("{:.6}", s.max_drawdown_pct),
            &format!("{:.4}", s.profit_factor),
            &format!("{:.4}", s.recovery_factor),
            &s.max_consecutive_wins.to_string(),
            &s.max_consecutive_losses.to_string(),
            &format!("{:.2}", s.trades_per_month),
            &format!("{:.2}", s.avg_holding_minutes),
            &format!("{:.6}", s.avg_max_favorable_pct),
            &format!("{:.6}", s.avg_max_adverse_pct),
            &s.stop_loss_exits.to_string(),
            &s.take_profit_exits.to_string(),
            &s.timeout_exits.to_string(),
            &format!("{:.4}", s.performance_score),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a backtest run under `output_dir/<name>/`.
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&result.name);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&result.trades)?)?;
    std::fs::write(
        run_dir.join("pattern_summary.csv"),
        export_summary_csv(&result.patterns)?,
    )?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Render the per-pattern breakdown as a fixed-width console table.
pub fn render_breakdown(result: &BacktestResult) -> String {
    let mut out = String::with_capacity(2048);
    out.push_str(&format!(
        "{} | {} {} | {} to {} | run {}\n\n",
        result.name,
        result.symbol,
        result.timeframe,
        result.start_date,
        result.end_date,
        result.run_id.chars().take(12).collect::<String>(),
    ));
    out.push_str(&format!(
        "{:<3} {:<30} {:>7} {:>6} {:>7} {:>6} {:>8} {:>12} {:>8} {:>7} {:>8}\n",
        "#", "Pattern", "Signals", "Trades", "Skipped", "Wins", "WinRate", "PnL", "Sharpe", "PF", "Score"
    ));
    out.push_str(&"-".repeat(111));
    out.push('\n');
    for s in &result.patterns {
        out.push_str(&format!(
            "{:<3} {:<30} {:>7} {:>6} {:>7} {:>6} {:>7.1}% {:>12.2} {:>8.3} {:>7.2} {:>8.2}\n",
            s.pattern.index(),
            s.name,
            s.total_signals,
            s.trades,
            s.skipped,
            s.winners,
            s.win_rate * 100.0,
            s.total_pnl,
            s.sharpe,
            s.profit_factor,
            s.performance_score,
        ));
    }
    out.push_str(&"-".repeat(111));
    out.push('\n');

    let t = &result.totals;
    out.push_str(&format!(
        "Total: {} signals, {} trades, {} skipped, {} unresolved, win rate {:.1}%, PnL {:.2}\n",
        t.total_signals,
        t.total_trades,
        t.skipped,
        t.unresolved,
        t.win_rate * 100.0,
        t.total_pnl
    ));
    if let Some(best) = t.best_pattern {
        out.push_str(&format!("Best pattern: {} ({})\n", best.index(), best.name()));
    }
    if !t.ranking.is_empty() {
        let order: Vec<String> = t.ranking.iter().map(|id| id.index().to_string()).collect();
        out.push_str(&format!("Ranking by score: {}\n", order.join(" > ")));
    }
    out
}
