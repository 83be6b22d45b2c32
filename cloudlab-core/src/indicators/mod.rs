//! Indicator math.
//!
//! Two indicators are computed over a bar series, each producing aligned
//! `Vec<Option<f64>>` outputs where `None` marks an undefined value
//! (insufficient history or a displacement past the series edge):
//!
//! - `TrendCloud`: conversion, base, leading A/B and lagging lines
//! - `DirectionalStrength`: +DI, -DI and the Wilder-smoothed strength index
//!
//! `compute_frames` joins both into one `IndicatorFrame` per bar.

pub mod directional;
pub mod frame;
pub mod trend_cloud;
pub mod wilder;
pub mod window;

pub use directional::DirectionalStrength;
pub use frame::{compute_frames, IndicatorFrame, IndicatorParams};
pub use trend_cloud::TrendCloud;
pub use wilder::{true_range, wilder_smooth};
pub use window::{displace_backward, displace_forward, rolling_midpoint};

/// Create synthetic one-minute bars from close prices for testing.
///
/// Generates plausible OHL: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create one-minute bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(base + chrono::Duration::minutes(i as i64), open, high, low, close)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
