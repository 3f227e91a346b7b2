#![forbid(unsafe_code)]

//! The external date store the engine writes to.

use chrono::NaiveDate;
use thiserror::Error;

use gantt_core::{DateRange, DragAction, SubjectId, SubjectKind};

/// Failure reported by a [`DateSink`]. The engine never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("update rejected for {subject}: {reason}")]
    Rejected { subject: SubjectId, reason: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl PersistenceError {
    #[must_use]
    pub fn rejected(subject: SubjectId, reason: impl Into<String>) -> Self {
        Self::Rejected {
            subject,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Dates to change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatePatch {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DatePatch {
    /// The fields `action` touches, taken from `range`.
    #[must_use]
    pub const fn for_action(action: DragAction, range: DateRange) -> Self {
        match action {
            DragAction::Move => Self {
                start: Some(range.start),
                end: Some(range.end),
            },
            DragAction::ResizeStart => Self {
                start: Some(range.start),
                end: None,
            },
            DragAction::ResizeEnd => Self {
                start: None,
                end: Some(range.end),
            },
        }
    }

    /// Both dates.
    #[must_use]
    pub const fn full(range: DateRange) -> Self {
        Self::for_action(DragAction::Move, range)
    }
}

/// Write flags forwarded to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Suppress user-facing notifications for this write. Set for
    /// intermediate writes during a drag.
    pub silent: bool,
}

impl UpdateOptions {
    pub const SILENT: Self = Self { silent: true };
    pub const NOTIFY: Self = Self { silent: false };
}

/// Destination of committed dates.
///
/// Implementations are called on the engine's thread, from inside
/// `tick`, `pointer_up`, or `teardown`.
pub trait DateSink {
    fn update_subject_dates(
        &self,
        subject: SubjectId,
        kind: SubjectKind,
        patch: DatePatch,
        options: UpdateOptions,
    ) -> Result<(), PersistenceError>;
}
