//! Rolling range midpoints and time displacement.
//!
//! Displacement is plain index arithmetic with a bounds check: anything that
//! would read outside `[0, n-1]` is undefined. Nothing wraps and nothing is
//! clamped to the series edge.

use crate::domain::Bar;

/// `(max(high) + min(low)) / 2` over the `period` bars ending at each index.
///
/// Undefined for the first `period - 1` bars.
pub fn rolling_midpoint(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &bars[i + 1 - period..=i];
        let mut max_high = f64::NEG_INFINITY;
        let mut min_low = f64::INFINITY;
        for bar in window {
            max_high = max_high.max(bar.high);
            min_low = min_low.min(bar.low);
        }
        result[i] = Some((max_high + min_low) / 2.0);
    }

    result
}

/// Plot `values` `offset` bars later: `out[i] = values[i - offset]`.
pub fn displace_forward(values: &[Option<f64>], offset: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(offset).and_then(|src| values[src]))
        .collect()
}

/// Plot `values` `offset` bars earlier: `out[i] = values[i + offset]`.
pub fn displace_backward(values: &[Option<f64>], offset: usize) -> Vec<Option<f64>> {
    let n = values.len();
    (0..n)
        .map(|i| {
            i.checked_add(offset)
                .filter(|&src| src < n)
                .and_then(|src| values[src])
        })
        .collect()
}

/// Element-wise mean of two series; undefined where either side is.
pub fn average(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((x + y) / 2.0),
            _ => None,
        })
        .collect()
}
