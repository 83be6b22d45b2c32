//! Directional strength — Wilder's +DI / -DI and the smoothed DX (ADX).
//!
//! Steps:
//! 1. Raw +DM, -DM and true range from consecutive bars (bar 0 undefined)
//! 2. Wilder-smooth +DM, -DM and TR over `period`
//! 3. +DI = 100 * s(+DM) / s(TR), -DI = 100 * s(-DM) / s(TR)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. Strength = Wilder-smoothed DX
//!
//! Zero denominators resolve to 0: a zero smoothed TR gives DI = 0, a zero DI
//! sum gives DX = 0. A series with no movement therefore reads strength 0.

use serde::Serialize;

use super::wilder::{true_range, wilder_smooth};
use crate::domain::Bar;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectionalStrength {
    pub plus_dm: Vec<Option<f64>>,
    pub minus_dm: Vec<Option<f64>>,
    pub true_range: Vec<Option<f64>>,
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
    pub dx: Vec<Option<f64>>,
    pub strength: Vec<Option<f64>>,
}

/// Raw directional movement for one bar pair.
///
/// Only the larger of the two moves counts, and only when positive.
pub fn directional_movement(prev: &Bar, bar: &Bar) -> (f64, f64) {
    let up = bar.high - prev.high;
    let down = prev.low - bar.low;
    let plus = if up > down && up > 0.0 { up } else { 0.0 };
    let minus = if down > up && down > 0.0 { down } else { 0.0 };
    (plus, minus)
}

fn ratio_pct(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        100.0 * num / den
    }
}

impl DirectionalStrength {
    pub fn compute(bars: &[Bar], period: usize) -> Self {
        let n = bars.len();
        let mut plus_dm = vec![None; n];
        let mut minus_dm = vec![None; n];

        for i in 1..n {
            let (plus, minus) = directional_movement(&bars[i - 1], &bars[i]);
            plus_dm[i] = Some(plus);
            minus_dm[i] = Some(minus);
        }

        let tr = true_range(bars);
        let smooth_tr = wilder_smooth(&tr, period);
        let smooth_plus = wilder_smooth(&plus_dm, period);
        let smooth_minus = wilder_smooth(&minus_dm, period);

        let mut plus_di = vec![None; n];
        let mut minus_di = vec![None; n];
        let mut dx = vec![None; n];

        for i in 0..n {
            let (Some(str_), Some(sp), Some(sm)) = (smooth_tr[i], smooth_plus[i], smooth_minus[i])
            else {
                continue;
            };
            let pdi = ratio_pct(sp, str_);
            let mdi = ratio_pct(sm, str_);
            plus_di[i] = Some(pdi);
            minus_di[i] = Some(mdi);
            dx[i] = Some(ratio_pct((pdi - mdi).abs(), pdi + mdi));
        }

        let strength = wilder_smooth(&dx, period);

        Self {
            plus_dm,
            minus_dm,
            true_range: tr,
            plus_di,
            minus_di,
            dx,
            strength,
        }
    }

    /// Index of the first bar with a defined strength value: `2 * period - 1`.
    pub fn lookback(period: usize) -> usize {
        (2 * period).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn dm_takes_only_dominant_positive_move() {
        let bars = make_ohlc_bars(&[
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 14.0, 8.5, 13.0), // up 2, down 0.5 -> +DM 2
            (13.0, 14.5, 6.5, 7.0),  // up 0.5, down 2 -> -DM 2
            (7.0, 13.5, 5.5, 6.0),   // up -1, down 1 -> -DM 1
            (6.0, 14.5, 4.5, 5.0),   // up 1, down 1 -> tie, both 0
        ]);
        let ds = DirectionalStrength::compute(&bars, 2);
        assert_eq!(ds.plus_dm[0], None);
        assert_eq!(ds.plus_dm[1], Some(2.0));
        assert_eq!(ds.minus_dm[1], Some(0.0));
        assert_eq!(ds.plus_dm[2], Some(0.0));
        assert_eq!(ds.minus_dm[2], Some(2.0));
        assert_eq!(ds.plus_dm[3], Some(0.0));
        assert_eq!(ds.minus_dm[3], Some(1.0));
        assert_eq!(ds.plus_dm[4], Some(0.0));
        assert_eq!(ds.minus_dm[4], Some(0.0));
    }

    #[test]
    fn strength_bounds() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let ds = DirectionalStrength::compute(&bars, 3);
        for (i, v) in ds.strength.iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "strength out of bounds at bar {i}: {v}");
            }
        }
        for v in ds.plus_di.iter().chain(&ds.minus_di).flatten() {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn first_defined_strength_at_lookback() {
        let data: Vec<_> = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64;
                (base, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let ds = DirectionalStrength::compute(&make_ohlc_bars(&data), 14);
        assert_eq!(DirectionalStrength::lookback(14), 27);
        assert!(ds.plus_di[13].is_none());
        assert!(ds.plus_di[14].is_some());
        assert!(ds.strength[26].is_none());
        assert!(ds.strength[27].is_some());
    }

    #[test]
    fn pure_uptrend_reads_full_strength() {
        let data: Vec<_> = (0..60)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                (base, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let ds = DirectionalStrength::compute(&make_ohlc_bars(&data), 14);
        assert_approx(ds.minus_di[59].unwrap(), 0.0, DEFAULT_EPSILON);
        assert_approx(ds.dx[59].unwrap(), 100.0, DEFAULT_EPSILON);
        assert_approx(ds.strength[59].unwrap(), 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_series_has_zero_strength() {
        let bars = make_ohlc_bars(&[(50.0, 50.0, 50.0, 50.0); 100]);
        let ds = DirectionalStrength::compute(&bars, 14);
        for i in 27..100 {
            assert_eq!(ds.plus_di[i], Some(0.0));
            assert_eq!(ds.minus_di[i], Some(0.0));
            assert_eq!(ds.strength[i], Some(0.0));
        }
    }

    #[test]
    fn too_few_bars() {
        let ds = DirectionalStrength::compute(&make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]), 3);
        assert!(ds.strength.iter().all(Option::is_none));
    }
}
