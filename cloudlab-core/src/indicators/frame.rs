//! Per-bar indicator frames.
//!
//! Both indicators are precomputed once over the whole series and then
//! transposed into one `IndicatorFrame` per bar, aligned 1:1 with the bars.
//! No recomputation happens inside the pattern or backtest loops.

use serde::{Deserialize, Serialize};

use super::directional::DirectionalStrength;
use super::trend_cloud::TrendCloud;
use crate::domain::Bar;

/// Window lengths for both indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub conversion_period: usize,
    pub base_period: usize,
    pub span_b_period: usize,
    pub displacement: usize,
    pub strength_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            conversion_period: 9,
            base_period: 26,
            span_b_period: 52,
            displacement: 26,
            strength_period: 14,
        }
    }
}

impl IndicatorParams {
    /// Bars before this index are never considered valid.
    ///
    /// Longest rolling window + forward displacement + smoothing window
    /// (52 + 26 + 14 = 92 with the defaults).
    pub fn warmup_bars(&self) -> usize {
        let longest = self
            .conversion_period
            .max(self.base_period)
            .max(self.span_b_period);
        longest + self.displacement + self.strength_period
    }
}

/// Derived values for one bar. `None` means undefined at this bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub conversion_line: Option<f64>,
    pub base_line: Option<f64>,
    pub leading_a: Option<f64>,
    pub leading_b: Option<f64>,
    pub lagging_line: Option<f64>,
    pub plus_dm: Option<f64>,
    pub minus_dm: Option<f64>,
    pub true_range: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub strength: Option<f64>,
    /// False for bars inside the warm-up horizon.
    pub warm: bool,
}

/// Compute both indicators and align them into per-bar frames.
pub fn compute_frames(bars: &[Bar], params: &IndicatorParams) -> Vec<IndicatorFrame> {
    let cloud = TrendCloud::compute(bars, params);
    let ds = DirectionalStrength::compute(bars, params.strength_period);
    let warmup = params.warmup_bars();

    (0..bars.len())
        .map(|i| IndicatorFrame {
            conversion_line: cloud.conversion_line[i],
            base_line: cloud.base_line[i],
            leading_a: cloud.leading_a[i],
            leading_b: cloud.leading_b[i],
            lagging_line: cloud.lagging_line[i],
            plus_dm: ds.plus_dm[i],
            minus_dm: ds.minus_dm[i],
            true_range: ds.true_range[i],
            plus_di: ds.plus_di[i],
            minus_di: ds.minus_di[i],
            strength: ds.strength[i],
            warm: i >= warmup,
        })
        .collect()
}
