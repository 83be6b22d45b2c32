//! The ten pattern predicates.
//!
//! Each rule is a plain function over the bar/frame slices and a bar index,
//! reading bar `i` and at most the two bars before it. A rule returns `None`
//! when any input it needs is undefined; the evaluator turns that into
//! `Signal::None`. Rules never see each other's output.

use crate::domain::{Bar, Signal};
use crate::indicators::IndicatorFrame;

/// Strength threshold for most patterns.
pub const STRONG_TREND: f64 = 25.0;
/// Lower threshold used by the conversion/base crossover and the B bounce.
pub const MODERATE_TREND: f64 = 20.0;

/// Read-only view the rules evaluate against.
#[derive(Debug, Clone, Copy)]
pub struct PatternContext<'a> {
    pub bars: &'a [Bar],
    pub frames: &'a [IndicatorFrame],
}

impl<'a> PatternContext<'a> {
    /// # Panics
    ///
    /// Panics if `bars` and `frames` differ in length.
    pub fn new(bars: &'a [Bar], frames: &'a [IndicatorFrame]) -> Self {
        assert_eq!(
            bars.len(),
            frames.len(),
            "indicator frames must align 1:1 with bars"
        );
        Self { bars, frames }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    fn close(&self, i: usize) -> f64 {
        self.bars[i].close
    }

    fn frame(&self, i: usize) -> &IndicatorFrame {
        &self.frames[i]
    }
}

pub type Rule = fn(&PatternContext<'_>, usize) -> Option<Signal>;

/// Rules indexed by pattern id.
pub const RULES: [Rule; 10] = [
    price_leading_a_cross,
    conversion_base_cross,
    cloud_twist,
    leading_a_bounce,
    lagging_confirmation,
    conversion_bounce,
    price_base_cross,
    leading_b_bounce,
    price_outside_cloud,
    lagging_outside_cloud,
];

/// Strict crossover of `a` through `b` between the previous and current bar.
///
/// Equality on either bar is not a cross.
pub fn cross(a_prev: f64, b_prev: f64, a_cur: f64, b_cur: f64) -> Signal {
    if a_prev < b_prev && a_cur > b_cur {
        Signal::Buy
    } else if a_prev > b_prev && a_cur < b_cur {
        Signal::Sell
    } else {
        Signal::None
    }
}

/// One-bar dip-and-recover against a reference line.
///
/// Bullish: above at i-2, at-or-below at i-1, above again at i.
/// Bearish: below, at-or-above, below.
pub fn bounce(closes: [f64; 3], refs: [f64; 3]) -> Signal {
    let [c2, c1, c0] = closes;
    let [r2, r1, r0] = refs;
    if c2 > r2 && c1 <= r1 && c0 > r0 {
        Signal::Buy
    } else if c2 < r2 && c1 >= r1 && c0 < r0 {
        Signal::Sell
    } else {
        Signal::None
    }
}

fn gate(signal: Signal, strength: f64, threshold: f64) -> Signal {
    if strength >= threshold {
        signal
    } else {
        Signal::None
    }
}

/// Keep a buy only when +DI leads and a sell only when -DI leads.
fn confirm_direction(signal: Signal, frame: &IndicatorFrame) -> Option<Signal> {
    let plus = frame.plus_di?;
    let minus = frame.minus_di?;
    Some(match signal {
        Signal::Buy if plus > minus => Signal::Buy,
        Signal::Sell if minus > plus => Signal::Sell,
        _ => Signal::None,
    })
}

fn line_cross(
    i: usize,
    a: impl Fn(usize) -> Option<f64>,
    b: impl Fn(usize) -> Option<f64>,
) -> Option<Signal> {
    let p = i.checked_sub(1)?;
    Some(cross(a(p)?, b(p)?, a(i)?, b(i)?))
}

fn line_bounce(
    ctx: &PatternContext<'_>,
    i: usize,
    reference: impl Fn(&IndicatorFrame) -> Option<f64>,
) -> Option<Signal> {
    let p2 = i.checked_sub(2)?;
    let p1 = i - 1;
    let refs = [
        reference(ctx.frame(p2))?,
        reference(ctx.frame(p1))?,
        reference(ctx.frame(i))?,
    ];
    Some(bounce([ctx.close(p2), ctx.close(p1), ctx.close(i)], refs))
}

/// 0: close crosses leading A.
fn price_leading_a_cross(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let strength = ctx.frame(i).strength?;
    let signal = line_cross(i, |j| Some(ctx.close(j)), |j| ctx.frame(j).leading_a)?;
    Some(gate(signal, strength, STRONG_TREND))
}

/// 1: conversion line crosses base line.
fn conversion_base_cross(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let strength = ctx.frame(i).strength?;
    let signal = line_cross(
        i,
        |j| ctx.frame(j).conversion_line,
        |j| ctx.frame(j).base_line,
    )?;
    Some(gate(signal, strength, MODERATE_TREND))
}

/// 2: leading A crosses leading B (cloud twist).
fn cloud_twist(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let strength = ctx.frame(i).strength?;
    let signal = line_cross(i, |j| ctx.frame(j).leading_a, |j| ctx.frame(j).leading_b)?;
    Some(gate(signal, strength, STRONG_TREND))
}

/// 3: bounce at leading A, confirmed by the leading DI.
fn leading_a_bounce(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let frame = ctx.frame(i);
    let strength = frame.strength?;
    let signal = line_bounce(ctx, i, |f| f.leading_a)?;
    let signal = confirm_direction(signal, frame)?;
    Some(gate(signal, strength, STRONG_TREND))
}

/// 4: lagging line against leading A at the current bar.
fn lagging_confirmation(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let frame = ctx.frame(i);
    let strength = frame.strength?;
    let lagging = frame.lagging_line?;
    let a = frame.leading_a?;
    let signal = if lagging > a {
        Signal::Buy
    } else if lagging < a {
        Signal::Sell
    } else {
        Signal::None
    };
    Some(gate(signal, strength, STRONG_TREND))
}

/// 5: bounce at the conversion line.
fn conversion_bounce(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let strength = ctx.frame(i).strength?;
    let signal = line_bounce(ctx, i, |f| f.conversion_line)?;
    Some(gate(signal, strength, STRONG_TREND))
}

/// 6: close crosses the base line, confirmed by the leading DI.
fn price_base_cross(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let frame = ctx.frame(i);
    let strength = frame.strength?;
    let signal = line_cross(i, |j| Some(ctx.close(j)), |j| ctx.frame(j).base_line)?;
    let signal = confirm_direction(signal, frame)?;
    Some(gate(signal, strength, STRONG_TREND))
}

/// 7: bounce at leading B inside a cloud of the same colour.
fn leading_b_bounce(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let frame = ctx.frame(i);
    let strength = frame.strength?;
    let a = frame.leading_a?;
    let b = frame.leading_b?;
    let signal = match line_bounce(ctx, i, |f| f.leading_b)? {
        Signal::Buy if a > b => Signal::Buy,
        Signal::Sell if b > a => Signal::Sell,
        _ => Signal::None,
    };
    Some(gate(signal, strength, MODERATE_TREND))
}

/// 8: two closes on the same side of leading A, moving away, with the cloud agreeing.
fn price_outside_cloud(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let p = i.checked_sub(1)?;
    let frame = ctx.frame(i);
    let strength = frame.strength?;
    let a = frame.leading_a?;
    let b = frame.leading_b?;
    let a_prev = ctx.frame(p).leading_a?;
    let (close, close_prev) = (ctx.close(i), ctx.close(p));

    let signal = if close > a && close_prev > a_prev && close_prev < close && a > b {
        Signal::Buy
    } else if close < a && close_prev < a_prev && close_prev > close && a < b {
        Signal::Sell
    } else {
        Signal::None
    };
    Some(gate(signal, strength, STRONG_TREND))
}

/// 9: lagging line beyond leading A with the cloud agreeing.
fn lagging_outside_cloud(ctx: &PatternContext<'_>, i: usize) -> Option<Signal> {
    let frame = ctx.frame(i);
    let strength = frame.strength?;
    let lagging = frame.lagging_line?;
    let a = frame.leading_a?;
    let b = frame.leading_b?;
    let signal = if lagging > a && a > b {
        Signal::Buy
    } else if lagging < a && a < b {
        Signal::Sell
    } else {
        Signal::None
    };
    Some(gate(signal, strength, STRONG_TREND))
}
