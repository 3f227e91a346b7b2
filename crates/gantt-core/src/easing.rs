#![forbid(unsafe_code)]

//! Easing curve for viewport transitions.
//!
//! Maps `t ∈ [0, 1]` to progress in `[0, 1]`, with `f(0) = 0` and
//! `f(1) = 1`. Inputs outside the unit interval are clamped, so callers can
//! pass raw `elapsed / duration` ratios.

use std::f64::consts::PI;

/// Symmetric cosine ease-in-out: `(1 - cos(pi * t)) / 2`.
#[must_use]
pub fn ease_in_out_cosine(t: f64) -> f64 {
    let t = clamp_unit(t);
    (1.0 - (PI * t).cos()) / 2.0
}

fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}
