//! Criterion benchmarks for CloudLab hot paths.
//!
//! Benchmarks:
//! 1. Indicator precompute (trend cloud + directional strength → frames)
//! 2. Pattern evaluation (all ten patterns over the frame table)
//! 3. Per-pattern backtest over a one-minute feed

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cloudlab_core::backtest::{Backtest, TradeSimulator};
use cloudlab_core::domain::{Bar, PriceSeries};
use cloudlab_core::indicators::{compute_frames, IndicatorParams};
use cloudlab_core::patterns::PatternEvaluator;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar::new(
                start + Duration::minutes(i as i64),
                open,
                close + 1.5,
                close - 1.5,
                close,
            )
        })
        .collect()
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_frames");
    let params = IndicatorParams::default();
    for n in [1_000, 10_000, 100_000] {
        let bars = make_bars(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &bars, |b, bars| {
            b.iter(|| compute_frames(black_box(bars), &params));
        });
    }
    group.finish();
}

// ── 2. Patterns ──────────────────────────────────────────────────────

fn bench_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_patterns");
    let evaluator = PatternEvaluator::default();
    for n in [1_000, 10_000] {
        let bars = make_bars(n);
        let frames = compute_frames(&bars, &IndicatorParams::default());
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| evaluator.evaluate(black_box(&bars), black_box(&frames)));
        });
    }
    group.finish();
}

// ── 3. Backtest ──────────────────────────────────────────────────────

fn bench_backtest(c: &mut Criterion) {
    let bars = make_bars(20_000);
    let frames = compute_frames(&bars, &IndicatorParams::default());
    let table = PatternEvaluator::default().evaluate(&bars, &frames);
    let minutes = PriceSeries::new(bars.clone()).unwrap();
    let backtest = Backtest::new(TradeSimulator::default(), Duration::minutes(1));

    c.bench_function("run_all_20k", |b| {
        b.iter(|| backtest.run_all(black_box(&bars), black_box(&table), &minutes));
    });
}

criterion_group!(benches, bench_indicators, bench_patterns, bench_backtest);
criterion_main!(benches);
