#![forbid(unsafe_code)]

//! Pixel ↔ calendar-day conversion for the two timeline granularities.
//!
//! In [`DisplayMode::Day`] every column is one day wide. In
//! [`DisplayMode::Week`] every column is one week, split into seven equal
//! day slices, so motion stays fractional until a commit rounds it.
//!
//! # Invariants
//!
//! 1. Every function here is pure: identical inputs give identical outputs.
//! 2. `day_delta_to_pixels(pixels_to_day_delta(p))` returns `p` in Week mode
//!    (up to float error); Day mode rounds to whole columns first.
//! 3. Rounding is half-away-from-zero so left and right drags mirror.

use serde::{Deserialize, Serialize};

/// Reference day-column width in pixels.
pub const DEFAULT_DAY_COLUMN_PX: f64 = 40.0;

/// Reference week-column width in pixels (11 px per day).
pub const DEFAULT_WEEK_COLUMN_PX: f64 = 77.0;

/// Time granularity of the date axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// One column per day.
    #[default]
    Day,
    /// One column per week, seven day slices each.
    Week,
}

/// Column widths for both display modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnWidths {
    pub day_px: f64,
    pub week_px: f64,
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self {
            day_px: DEFAULT_DAY_COLUMN_PX,
            week_px: DEFAULT_WEEK_COLUMN_PX,
        }
    }
}

impl ColumnWidths {
    #[must_use]
    pub const fn new(day_px: f64, week_px: f64) -> Self {
        Self { day_px, week_px }
    }

    /// Width of one calendar day in pixels for `mode`.
    #[must_use]
    pub fn day_width(&self, mode: DisplayMode) -> f64 {
        match mode {
            DisplayMode::Day => self.day_px,
            DisplayMode::Week => self.week_px / 7.0,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.day_px.is_finite() && self.day_px > 0.0 && self.week_px.is_finite() && self.week_px > 0.0
    }
}

/// Convert a pixel displacement to a day displacement.
///
/// Day mode snaps to whole columns; Week mode keeps the fraction.
#[must_use]
pub fn pixels_to_day_delta(delta_px: f64, mode: DisplayMode, widths: ColumnWidths) -> f64 {
    let days = delta_px / widths.day_width(mode);
    match mode {
        DisplayMode::Day => days.round(),
        DisplayMode::Week => days,
    }
}

/// Convert a day displacement to a pixel displacement.
#[must_use]
pub fn day_delta_to_pixels(day_delta: f64, mode: DisplayMode, widths: ColumnWidths) -> f64 {
    day_delta * widths.day_width(mode)
}

/// Round a real-valued day delta to the integer that gets persisted.
///
/// Returns `None` for non-finite input or values outside the `i64` range.
#[must_use]
pub fn round_day_delta(day_delta: f64) -> Option<i64> {
    if !day_delta.is_finite() {
        return None;
    }
    let rounded = day_delta.round();
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}
