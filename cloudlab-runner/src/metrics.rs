//! Performance metrics — pure functions that summarise pattern ledgers.
//!
//! Every metric is a pure function: trade list or PnL sequence in, scalar
//! out. Empty input always yields 0, never NaN and never a panic.

use serde::{Deserialize, Serialize};
use cloudlab_core::backtest::PatternLedger;
use cloudlab_core::domain::{ExitReason, PatternId, Trade};

/// Per-pattern performance breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub pattern: PatternId,
    pub name: String,

    // Signal accounting
    pub total_signals: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub trades: usize,
    pub skipped: usize,
    pub unresolved: usize,
    pub winners: usize,
    pub losers: usize,
    /// Fraction of trades with pnl > 0.
    pub win_rate: f64,

    // PnL
    pub gross_pnl: f64,
    pub fees: f64,
    pub total_pnl: f64,
    pub avg_trade_pnl: f64,
    pub best_trade_pnl: f64,
    pub worst_trade_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Net PnL as a fraction of initial capital.
    pub total_return: f64,
    /// `total_return` scaled to a year over the span between first and last signal.
    pub annualized_return: f64,

    // Risk
    /// Sample stdev of per-trade PnL as a fraction of initial capital.
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar_ratio: f64,
    /// Deepest fall of cumulative PnL from its running peak (<= 0).
    pub max_drawdown: f64,
    /// `max_drawdown` as a fraction of initial capital.
    pub max_drawdown_pct: f64,
    pub profit_factor: f64,
    pub recovery_factor: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,

    // Activity & holding behaviour
    pub trades_per_month: f64,
    pub avg_holding_minutes: f64,
    pub avg_max_favorable_pct: f64,
    pub avg_max_adverse_pct: f64,
    pub stop_loss_exits: usize,
    pub take_profit_exits: usize,
    pub timeout_exits: usize,

    /// Composite ranking score; see [`performance_score`].
    pub performance_score: f64,
}

impl PatternSummary {
    /// Compute all metrics for one pattern's ledger.
    pub fn compute(ledger: &PatternLedger, initial_capital: f64) -> Self {
        let trades = &ledger.trades;
        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p <= 0.0).collect();
        let total_pnl: f64 = pnls.iter().sum();
        let drawdown = max_drawdown(&pnls);
        let drawdown_pct = ratio(drawdown, initial_capital);
        let span_days = trading_span_days(trades);
        let total_return = ratio(total_pnl, initial_capital);
        let annualized = annualized_return(total_return, span_days);
        let win = win_rate(trades);
        let sharpe = sharpe_ratio(&pnls);
        let pf = profit_factor(&pnls);

        Self {
            pattern: ledger.pattern,
            name: ledger.pattern.name().to_string(),
            total_signals: ledger.signals,
            buy_signals: ledger.buy_signals,
            sell_signals: ledger.sell_signals,
            trades: trades.len(),
            skipped: ledger.skipped,
            unresolved: ledger.unresolved,
            winners: wins.len(),
            losers: losses.len(),
            win_rate: win,
            gross_pnl: trades.iter().map(|t| t.gross_pnl).sum(),
            fees: trades.iter().map(|t| t.fees).sum(),
            total_pnl,
            avg_trade_pnl: mean_f64(&pnls),
            best_trade_pnl: pnls.iter().copied().fold(None, max_opt).unwrap_or(0.0),
            worst_trade_pnl: pnls.iter().copied().fold(None, min_opt).unwrap_or(0.0),
            avg_win: mean_f64(&wins),
            avg_loss: mean_f64(&losses),
            total_return,
            annualized_return: annualized,
            volatility: ratio(std_dev(&pnls), initial_capital),
            sharpe,
            sortino: sortino_ratio(&pnls),
            calmar_ratio: calmar_ratio(annualized, drawdown_pct),
            max_drawdown: drawdown,
            max_drawdown_pct: drawdown_pct,
            profit_factor: pf,
            recovery_factor: if drawdown < 0.0 {
                (total_pnl / drawdown).abs()
            } else {
                0.0
            },
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
            trades_per_month: trades_per_month(trades.len(), span_days),
            avg_holding_minutes: mean_f64(
                &trades
                    .iter()
                    .map(|t| t.holding_minutes() as f64)
                    .collect::<Vec<_>>(),
            ),
            avg_max_favorable_pct: mean_f64(
                &trades.iter().map(|t| t.max_favorable_pct).collect::<Vec<_>>(),
            ),
            avg_max_adverse_pct: mean_f64(
                &trades.iter().map(|t| t.max_adverse_pct).collect::<Vec<_>>(),
            ),
            stop_loss_exits: count_exits(trades, ExitReason::StopLoss),
            take_profit_exits: count_exits(trades, ExitReason::TakeProfit),
            timeout_exits: count_exits(trades, ExitReason::Timeout),
            performance_score: performance_score(win, total_return, sharpe, pf),
        }
    }
}

/// Totals across all patterns of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub total_signals: usize,
    pub total_trades: usize,
    pub skipped: usize,
    pub unresolved: usize,
    pub winners: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub fees: f64,
    /// Pattern with the highest total PnL among those that traded.
    pub best_pattern: Option<PatternId>,
    /// Patterns that traded, best performance score first.
    #[serde(default)]
    pub ranking: Vec<PatternId>,
}

impl RunTotals {
    pub fn compute(summaries: &[PatternSummary]) -> Self {
        let total_trades: usize = summaries.iter().map(|s| s.trades).sum();
        let winners: usize = summaries.iter().map(|s| s.winners).sum();
        Self {
            total_signals: summaries.iter().map(|s| s.total_signals).sum(),
            total_trades,
            skipped: summaries.iter().map(|s| s.skipped).sum(),
            unresolved: summaries.iter().map(|s| s.unresolved).sum(),
            winners,
            win_rate: ratio(winners as f64, total_trades as f64),
            total_pnl: summaries.iter().map(|s| s.total_pnl).sum(),
            fees: summaries.iter().map(|s| s.fees).sum(),
            best_pattern: summaries
                .iter()
                .filter(|s| s.trades > 0)
                .max_by(|a, b| a.total_pnl.total_cmp(&b.total_pnl))
                .map(|s| s.pattern),
            ranking: rank_by_score(summaries),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Win rate: fraction of trades that were winners.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Per-trade Sharpe-style ratio: mean(pnl) / std(pnl).
///
/// Returns 0.0 if variance is zero or fewer than 2 trades.
pub fn sharpe_ratio(pnls: &[f64]) -> f64 {
    if pnls.len() < 2 {
        return 0.0;
    }
    let std = std_dev(pnls);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(pnls) / std
}

/// Per-trade Sortino-style ratio: mean(pnl) / downside deviation.
///
/// Returns 0.0 if there is no downside or fewer than 2 trades.
pub fn sortino_ratio(pnls: &[f64]) -> f64 {
    if pnls.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = pnls.iter().filter(|p| **p < 0.0).map(|p| p * p).sum();
    if downside_sq == 0.0 {
        return 0.0;
    }
    let downside_std = (downside_sq / pnls.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(pnls) / downside_std
}

/// Maximum drawdown of cumulative PnL, as a non-positive amount.
///
/// The running peak starts at 0 (flat before the first trade).
pub fn max_drawdown(pnls: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for pnl in pnls {
        cumulative += pnl;
        peak = peak.max(cumulative);
        max_dd = max_dd.min(cumulative - peak);
    }
    max_dd
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(pnls: &[f64]) -> f64 {
    if pnls.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = pnls.iter().filter(|p| **p > 0.0).sum();
    let gross_loss: f64 = pnls.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Whole days between the first and last signal of a trade list.
pub fn trading_span_days(trades: &[Trade]) -> i64 {
    let first = trades.iter().map(|t| t.signal_time).min();
    let last = trades.iter().map(|t| t.signal_time).max();
    match (first, last) {
        (Some(first), Some(last)) => (last - first).num_days(),
        _ => 0,
    }
}

/// Total return scaled to 365.25 days. 0 when the span is under a day.
pub fn annualized_return(total_return: f64, span_days: i64) -> f64 {
    if span_days <= 0 {
        return 0.0;
    }
    total_return / (span_days as f64 / 365.25)
}

/// Calmar ratio: annualized return / |max drawdown fraction|.
///
/// Returns 0.0 when there was no drawdown.
pub fn calmar_ratio(annualized_return: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct < 0.0 {
        annualized_return / max_drawdown_pct.abs()
    } else {
        0.0
    }
}

/// Trades per 30.44-day month over the trading span.
pub fn trades_per_month(trades: usize, span_days: i64) -> f64 {
    if span_days <= 0 {
        return 0.0;
    }
    trades as f64 / span_days as f64 * 30.44
}

/// Composite score used to rank patterns.
///
/// `0.3 * win% + 0.4 * return% + 2 * sharpe + profit_factor`, with win rate
/// and return expressed in percent.
pub fn performance_score(
    win_rate: f64,
    total_return: f64,
    sharpe: f64,
    profit_factor: f64,
) -> f64 {
    win_rate * 100.0 * 0.3
        + total_return * 100.0 * 0.4
        + sharpe * 10.0 * 0.2
        + profit_factor * 10.0 * 0.1
}

/// Patterns with at least one trade, ordered by descending performance
/// score. Ties keep pattern-id order.
pub fn rank_by_score(summaries: &[PatternSummary]) -> Vec<PatternId> {
    let mut traded: Vec<&PatternSummary> = summaries.iter().filter(|s| s.trades > 0).collect();
    traded.sort_by(|a, b| {
        b.performance_score
            .total_cmp(&a.performance_score)
            .then(a.pattern.cmp(&b.pattern))
    });
    traded.into_iter().map(|s| s.pattern).collect()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

fn max_opt(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.max(v)))
}

fn min_opt(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.min(v)))
}

fn count_exits(trades: &[Trade], reason: ExitReason) -> usize {
    trades.iter().filter(|t| t.exit_reason == reason).count()
}

fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
