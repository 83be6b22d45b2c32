//! Trend cloud — five lines built from rolling range midpoints.
//!
//! - Conversion line: midpoint over `conversion_period` (9)
//! - Base line: midpoint over `base_period` (26)
//! - Leading A: mean of conversion and base, plotted `displacement` (26) bars forward
//! - Leading B: midpoint over `span_b_period` (52), plotted 26 bars forward
//! - Lagging line: close plotted 26 bars back, so `lagging[i] = close[i + 26]`
//!
//! The lagging line reads future closes by construction and is undefined for
//! the last `displacement` bars of any finite series. The other four lines only
//! read bars at or before `i`.

use serde::Serialize;

use super::frame::IndicatorParams;
use super::window::{average, displace_backward, displace_forward, rolling_midpoint};
use crate::domain::Bar;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendCloud {
    pub conversion_line: Vec<Option<f64>>,
    pub base_line: Vec<Option<f64>>,
    pub leading_a: Vec<Option<f64>>,
    pub leading_b: Vec<Option<f64>>,
    pub lagging_line: Vec<Option<f64>>,
}

impl TrendCloud {
    pub fn compute(bars: &[Bar], params: &IndicatorParams) -> Self {
        let conversion_line = rolling_midpoint(bars, params.conversion_period);
        let base_line = rolling_midpoint(bars, params.base_period);
        let span_b = rolling_midpoint(bars, params.span_b_period);

        let leading_a = displace_forward(&average(&conversion_line, &base_line), params.displacement);
        let leading_b = displace_forward(&span_b, params.displacement);

        let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
        let lagging_line = displace_backward(&closes, params.displacement);

        Self {
            conversion_line,
            base_line,
            leading_a,
            leading_b,
            lagging_line,
        }
    }

    pub fn len(&self) -> usize {
        self.conversion_line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversion_line.is_empty()
    }
}
