//! True range and Wilder smoothing.
//!
//! Wilder smoothing is a recursive filter with decay 1/N:
//! `s[t] = s[t-1] - s[t-1]/N + x[t]/N`, seeded with the mean of the first N
//! defined inputs. It is not the conventional 2/(N+1) EMA.

use crate::domain::Bar;

/// True range per bar.
///
/// `TR[t] = max(high-low, |high-close[t-1]|, |low-close[t-1]|)` for t >= 1.
/// Bar 0 has no previous close and is undefined.
pub fn true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut tr = vec![None; bars.len()];
    for i in 1..bars.len() {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = Some((h - l).max((h - pc).abs()).max((l - pc).abs()));
    }
    tr
}

/// Apply Wilder smoothing to a series with undefined gaps.
///
/// The output is undefined until `period` consecutive defined inputs have been
/// seen. An undefined input resets the filter; it reseeds on the next full
/// window.
pub fn wilder_smooth(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 {
        return result;
    }

    let n = period as f64;
    let mut prev: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = *value else {
            prev = None;
            seed_sum = 0.0;
            seed_count = 0;
            continue;
        };

        match prev {
            Some(p) => {
                let s = p - p / n + x / n;
                result[i] = Some(s);
                prev = Some(s);
            }
            None => {
                seed_sum += x;
                seed_count += 1;
                if seed_count == period {
                    let seed = seed_sum / n;
                    result[i] = Some(seed);
                    prev = Some(seed);
                }
            }
        }
    }

    result
}
