//! CloudLab Core — indicators, pattern signals and the per-pattern backtest.
//!
//! This crate is pure computation with no I/O:
//! - Domain types (bars, validated price series, signals, positions, trades)
//! - Trend-cloud and directional-strength indicators, joined into per-bar frames
//! - Ten independent pattern predicates evaluated into a signal table
//! - Single-position trackers that resolve accepted signals against a
//!   one-minute feed through the trade simulator

pub mod backtest;
pub mod domain;
pub mod indicators;
pub mod patterns;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed across rayon workers are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::Timeframe>();
        require_sync::<domain::Timeframe>();

        // Indicator types
        require_send::<indicators::IndicatorFrame>();
        require_sync::<indicators::IndicatorFrame>();
        require_send::<indicators::IndicatorParams>();
        require_sync::<indicators::IndicatorParams>();

        // Pattern types
        require_send::<patterns::PatternEvaluator>();
        require_sync::<patterns::PatternEvaluator>();
        require_send::<patterns::SignalTable>();
        require_sync::<patterns::SignalTable>();

        // Backtest types
        require_send::<backtest::Backtest>();
        require_sync::<backtest::Backtest>();
        require_send::<backtest::PositionTracker>();
        require_sync::<backtest::PositionTracker>();
        require_send::<backtest::PatternLedger>();
        require_sync::<backtest::PatternLedger>();
    }

    /// Architecture contract: rules see only bars and indicator frames.
    ///
    /// A rule cannot read another pattern's output or any tracker state;
    /// the `Rule` signature has no parameter that could carry either.
    #[test]
    fn rules_have_no_tracker_parameter() {
        fn _check_rule_builds(
            rule: patterns::Rule,
            ctx: &patterns::PatternContext<'_>,
        ) -> Option<domain::Signal> {
            rule(ctx, 0)
        }
    }
}
