//! Look-ahead contamination tests for the indicators and pattern streams.
//!
//! Invariant: no value at bar t may depend on price data from bar t+1 or
//! later, except the lagging line, which is defined as `close[t + 26]`.
//!
//! Method: compute on a truncated series (bars 0..150) and the full series
//! (bars 0..260). Bars 0..150 must agree between both runs for every
//! non-lagging output.

use chrono::{Duration, NaiveDate};
use cloudlab_core::domain::{Bar, PatternId};
use cloudlab_core::indicators::{compute_frames, IndicatorFrame, IndicatorParams, TrendCloud};
use cloudlab_core::patterns::{PatternEvaluator, Trigger};

/// Generate N one-minute bars with a deterministic pseudo-random walk.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed >> 33) % 200) as f64 / 100.0 - 1.0; // -1.0 to +1.0
        let open = price;
        price = (price + change).max(10.0);
        let close = price;
        let high = open.max(close) + 0.4;
        let low = open.min(close) - 0.4;
        bars.push(Bar::new(start + Duration::minutes(i as i64), open, high, low, close));
    }

    bars
}

fn non_lagging(f: &IndicatorFrame) -> [Option<f64>; 9] {
    [
        f.conversion_line,
        f.base_line,
        f.leading_a,
        f.leading_b,
        f.plus_dm,
        f.minus_dm,
        f.plus_di,
        f.minus_di,
        f.strength,
    ]
}

#[test]
fn non_lagging_lines_ignore_future_bars() {
    let bars = make_test_bars(260);
    let params = IndicatorParams::default();
    let full = compute_frames(&bars, &params);
    let truncated = compute_frames(&bars[..150], &params);

    for i in 0..150 {
        assert_eq!(
            non_lagging(&full[i]),
            non_lagging(&truncated[i]),
            "bar {i} changed when future bars were appended"
        );
        assert_eq!(full[i].warm, truncated[i].warm);
    }
}

#[test]
fn lagging_line_is_exact_future_close() {
    let bars = make_test_bars(200);
    let cloud = TrendCloud::compute(&bars, &IndicatorParams::default());
    for i in 0..200 {
        match cloud.lagging_line[i] {
            Some(v) => assert_eq!(v, bars[i + 26].close, "bar {i}"),
            None => assert!(i + 26 >= 200, "bar {i} should be defined"),
        }
    }
}

#[test]
fn non_lagging_patterns_ignore_future_bars() {
    let bars = make_test_bars(260);
    let params = IndicatorParams::default();
    let lagging = [PatternId::new(4).unwrap(), PatternId::new(9).unwrap()];

    for trigger in [Trigger::Onset, Trigger::Level] {
        let evaluator = PatternEvaluator::new(trigger);
        let full = evaluator.evaluate(&bars, &compute_frames(&bars, &params));
        let cut = &bars[..150];
        let truncated = evaluator.evaluate(cut, &compute_frames(cut, &params));

        for id in PatternId::all().filter(|id| !lagging.contains(id)) {
            assert_eq!(
                &full.column(id)[..150],
                truncated.column(id),
                "{id} read future bars under {trigger:?}"
            );
        }
    }
}

#[test]
fn lagging_patterns_silent_in_last_displacement_bars() {
    let bars = make_test_bars(260);
    let frames = compute_frames(&bars, &IndicatorParams::default());
    let table = PatternEvaluator::new(Trigger::Level).evaluate(&bars, &frames);
    for id in [4u8, 9] {
        let column = table.column(PatternId::new(id).unwrap());
        assert!(
            column[260 - 26..].iter().all(|s| s.is_none()),
            "pattern {id} fired where the lagging line is undefined"
        );
    }
}
