#![forbid(unsafe_code)]

//! Calendar date ranges and checked day arithmetic.

use std::fmt;

use chrono::{NaiveDate, TimeDelta};

use crate::error::{EngineError, Result};

/// Inclusive `start..=end` span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EngineError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// `end - start` in days. Zero for a single-day item.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Both ends moved by `days`.
    pub fn shifted(&self, days: i64) -> Result<Self> {
        Ok(Self {
            start: add_days(self.start, days)?,
            end: add_days(self.end, days)?,
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// `date + days`, or `InvalidDate` when the result leaves chrono's range.
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or(EngineError::invalid_date("day offset leaves the calendar range"))
}

/// Signed number of days from `from` to `to`.
#[must_use]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn inverted_range_rejected() {
        let err = DateRange::new(d(2024, 1, 5), d(2024, 1, 4)).unwrap_err();
        assert!(matches!(err, EngineError::InvertedRange { .. }));
        assert!(DateRange::new(d(2024, 1, 5), d(2024, 1, 5)).is_ok());
    }

    #[test]
    fn shift_crosses_month_and_year() {
        let r = DateRange::new(d(2023, 12, 30), d(2024, 1, 2)).unwrap();
        let moved = r.shifted(3).unwrap();
        assert_eq!(moved.start, d(2024, 1, 2));
        assert_eq!(moved.end, d(2024, 1, 5));
        assert_eq!(moved.span_days(), r.span_days());
    }

    #[test]
    fn overflow_is_invalid_date() {
        let err = add_days(NaiveDate::MAX, 1).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDate { .. }));
        assert!(add_days(d(2024, 1, 1), i64::MAX).is_err());
    }

    #[test]
    fn days_between_is_signed() {
        let r = DateRange::new(d(2024, 3, 1), d(2024, 3, 10)).unwrap();
        assert_eq!(days_between(r.start, r.end), 9);
        assert_eq!(days_between(r.end, r.start), -9);
    }
}
