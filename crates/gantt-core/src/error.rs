#![forbid(unsafe_code)]

//! Error taxonomy for the drag and viewport engine.
//!
//! Validation failures ([`EngineError::InvalidDate`],
//! [`EngineError::ConstraintViolation`]) are resolved synchronously and never
//! reach the persistence sink. [`EngineError::InvalidSessionState`] marks a
//! lifecycle defect in the caller and is always logged at `error` level.

use chrono::NaiveDate;
use thiserror::Error;

use crate::drag::{DragAction, SubjectId};
use crate::viewport::WriteOwner;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// An input was not a valid point in time: a non-finite pointer
    /// coordinate or date arithmetic that left the calendar range.
    #[error("invalid date: {reason}")]
    InvalidDate { reason: &'static str },

    /// A proposed commit breaks ordering or minimum-duration rules.
    #[error(
        "{action:?} by {delta} day(s) rejected: {start}..{end} is shorter than {min_span_days} day(s)"
    )]
    ConstraintViolation {
        action: DragAction,
        delta: i64,
        start: NaiveDate,
        end: NaiveDate,
        min_span_days: i64,
    },

    /// Origin dates handed to `begin` are out of order.
    #[error("origin range is inverted: start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// An operation was invoked in the wrong lifecycle phase.
    #[error("invalid session state for subject {subject}: {detail}")]
    InvalidSessionState {
        subject: SubjectId,
        detail: &'static str,
    },

    /// A viewport write was attempted without the current write token.
    #[error("viewport write rejected: lock held by {holder:?}")]
    WriteRejected { holder: Option<WriteOwner> },
}

impl EngineError {
    pub(crate) const fn invalid_date(reason: &'static str) -> Self {
        Self::InvalidDate { reason }
    }

    /// Whether this error is a rejected commit (as opposed to bad input or
    /// a lifecycle defect).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }
}
