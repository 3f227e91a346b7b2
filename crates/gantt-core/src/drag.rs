#![forbid(unsafe_code)]

//! Drag sessions: pointer motion to visual and committed day deltas.
//!
//! A [`DragSession`] is a plain value owned by the caller and threaded
//! through every [`DragCoordinator`] call. The coordinator only remembers
//! which subjects are being dragged so that a second gesture on the same
//! item is refused.
//!
//! # State Machine
//!
//! ```text
//! Idle -> Dragging -> (Committed | Cancelled) -> Idle
//! ```
//!
//! `end` and `cancel` consume the session. Each session carries the epoch it
//! was begun under, so a clone kept past `end` or `cancel` is refused with
//! `InvalidSessionState` by every coordinator call.
//!
//! # Invariants
//!
//! 1. `origin_dates` is never mutated; every commit applies its delta to the
//!    origin, never to the previous commit.
//! 2. The pixel accumulator grows only by per-event increments measured from
//!    the last processed pointer, so the accumulated value equals the total
//!    displacement from the origin pointer (plus any viewport shifts).
//! 3. `should_persist` is true only when the rounded delta differs from the
//!    last committed one and was not just rejected.
//! 4. Day mode snaps with hysteresis: a neighbouring day is taken only once
//!    the pointer passes the column line between them by `snap_hysteresis`
//!    of a column. Week mode does not snap.
//!
//! # Failure Modes
//!
//! - Non-finite pointer coordinates: `InvalidDate`, session untouched.
//! - Commit that shortens an item below `min_span_days`: `ConstraintViolation`.
//! - Second `begin` for an active subject: `InvalidSessionState`.
//! - Move, shift, or commit on a finished session: `InvalidSessionState`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::error::{EngineError, Result};
use crate::range::DateRange;
use crate::units::{ColumnWidths, DisplayMode, round_day_delta};

/// Default fraction of a column the pointer must pass a line by before the
/// Day-mode visual snaps to the next day.
pub const DEFAULT_SNAP_HYSTERESIS: f64 = 0.3;

/// Default minimum `end - start` (in days) a resize may leave.
pub const DEFAULT_MIN_SPAN_DAYS: i64 = 1;

/// Largest day offset a single drag may reach. Anything beyond it is treated
/// as a broken input rather than a real gesture.
const MAX_DAY_DELTA: f64 = 3_000_000.0;

// ---------------------------------------------------------------------------
// Identity and input types
// ---------------------------------------------------------------------------

/// Opaque identifier of a draggable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(u64);

impl SubjectId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of bar is being dragged. Forwarded to the sink untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Project,
    Holiday,
}

/// Which part of the bar the gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragAction {
    /// Whole bar; both dates shift.
    Move,
    /// Left handle; only `start` changes.
    ResizeStart,
    /// Right handle; only `end` changes.
    ResizeEnd,
}

/// Pointer coordinates in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Snapping and validation knobs for drag sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Fraction of a column (0.0..1.0) the pointer must pass a column line
    /// by before the Day-mode visual moves to the next day.
    pub snap_hysteresis: f64,
    /// Minimum `end - start` in days that a resize may produce.
    pub min_span_days: i64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            snap_hysteresis: DEFAULT_SNAP_HYSTERESIS,
            min_span_days: DEFAULT_MIN_SPAN_DAYS,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// State of one active drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    epoch: u64,
    subject_id: SubjectId,
    subject_kind: SubjectKind,
    action: DragAction,
    mode: DisplayMode,
    day_width: f64,
    origin_pointer: PointerPosition,
    origin_dates: DateRange,
    last_pointer: PointerPosition,
    accumulator_px: f64,
    visual_delta: f64,
    snapped_day: i64,
    last_committed_delta: i64,
    last_rejected_delta: Option<i64>,
    last_valid_range: DateRange,
}

impl DragSession {
    #[must_use]
    pub const fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub const fn subject_kind(&self) -> SubjectKind {
        self.subject_kind
    }

    #[must_use]
    pub const fn action(&self) -> DragAction {
        self.action
    }

    #[must_use]
    pub const fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[must_use]
    pub const fn origin_pointer(&self) -> PointerPosition {
        self.origin_pointer
    }

    #[must_use]
    pub const fn origin_dates(&self) -> DateRange {
        self.origin_dates
    }

    /// Pointer position of the most recent processed move.
    #[must_use]
    pub const fn last_pointer(&self) -> PointerPosition {
        self.last_pointer
    }

    /// On-screen day offset: snapped in Day mode, fractional in Week mode.
    #[must_use]
    pub const fn visual_delta(&self) -> f64 {
        self.visual_delta
    }

    /// Unsnapped day offset derived from the pixel accumulator.
    #[must_use]
    pub fn raw_day_delta(&self) -> f64 {
        self.accumulator_px / self.day_width
    }

    /// Accumulated horizontal displacement in pixels.
    #[must_use]
    pub const fn accumulated_px(&self) -> f64 {
        self.accumulator_px
    }

    #[must_use]
    pub const fn last_committed_delta(&self) -> i64 {
        self.last_committed_delta
    }

    /// Range produced by the last accepted commit (origin until then).
    #[must_use]
    pub const fn last_valid_range(&self) -> DateRange {
        self.last_valid_range
    }

    /// Rounded delta the current visual position corresponds to.
    #[must_use]
    pub fn current_rounded_delta(&self) -> i64 {
        round_day_delta(self.visual_delta).unwrap_or(self.last_committed_delta)
    }

    fn wants_commit(&self, rounded: i64) -> bool {
        rounded != self.last_committed_delta && self.last_rejected_delta != Some(rounded)
    }
}

/// Result of feeding one pointer move (or viewport shift) into a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerUpdate {
    /// Day offset used for on-screen placement.
    pub visual_delta: f64,
    /// Unsnapped day offset.
    pub raw_delta: f64,
    /// `round(visual_delta)`; what a commit would persist.
    pub rounded_delta: i64,
    /// Whether the caller should commit `rounded_delta` now.
    pub should_persist: bool,
    /// Range to draw: the range at `rounded_delta` when it is acceptable,
    /// otherwise the last valid range.
    pub display_range: DateRange,
}

/// Outcome of ending a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome {
    pub subject_id: SubjectId,
    pub action: DragAction,
    /// Dates the item ends up with.
    pub final_range: DateRange,
    /// False when the gesture produced no net change; callers use it to
    /// suppress success notifications.
    pub changed: bool,
    /// Commit produced while flushing at pointer-up. It still has to be
    /// written to persistence by the caller.
    pub flushed: Option<DateRange>,
    /// Rejection hit while flushing, if any.
    pub rejected: Option<EngineError>,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Creates, advances, and finishes drag sessions.
#[derive(Debug, Clone)]
pub struct DragCoordinator {
    config: DragConfig,
    widths: ColumnWidths,
    /// Active subjects and the epoch of the session that owns each.
    active: HashMap<SubjectId, u64>,
    next_epoch: u64,
}

impl DragCoordinator {
    #[must_use]
    pub fn new(config: DragConfig, widths: ColumnWidths) -> Self {
        Self {
            config,
            widths,
            active: HashMap::new(),
            next_epoch: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DragConfig {
        &self.config
    }

    #[must_use]
    pub const fn widths(&self) -> ColumnWidths {
        self.widths
    }

    #[must_use]
    pub fn is_dragging(&self, subject: SubjectId) -> bool {
        self.active.contains_key(&subject)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Start a drag on `subject`.
    pub fn begin(
        &mut self,
        subject_id: SubjectId,
        subject_kind: SubjectKind,
        action: DragAction,
        origin_dates: DateRange,
        origin_pointer: PointerPosition,
        mode: DisplayMode,
    ) -> Result<DragSession> {
        if !origin_pointer.is_finite() {
            return Err(EngineError::invalid_date("non-finite origin pointer"));
        }
        let origin_dates = DateRange::new(origin_dates.start, origin_dates.end)?;
        let day_width = self.widths.day_width(mode);
        if !(day_width.is_finite() && day_width > 0.0) {
            return Err(EngineError::invalid_date("column width must be positive"));
        }
        if self.active.contains_key(&subject_id) {
            error!(subject = %subject_id, "drag begun while another drag is active");
            return Err(EngineError::InvalidSessionState {
                subject: subject_id,
                detail: "a drag is already active for this subject",
            });
        }
        self.next_epoch += 1;
        let epoch = self.next_epoch;
        self.active.insert(subject_id, epoch);
        debug!(
            subject = %subject_id,
            ?action,
            ?mode,
            origin = %origin_dates,
            "drag begin"
        );
        Ok(DragSession {
            epoch,
            subject_id,
            subject_kind,
            action,
            mode,
            day_width,
            origin_pointer,
            origin_dates,
            last_pointer: origin_pointer,
            accumulator_px: 0.0,
            visual_delta: 0.0,
            snapped_day: 0,
            last_committed_delta: 0,
            last_rejected_delta: None,
            last_valid_range: origin_dates,
        })
    }

    /// Feed the next pointer position. Events must arrive in receipt order.
    pub fn on_pointer_move(
        &self,
        session: &mut DragSession,
        pointer: PointerPosition,
    ) -> Result<PointerUpdate> {
        self.ensure_live(session)?;
        if !pointer.is_finite() {
            return Err(EngineError::invalid_date("non-finite pointer position"));
        }
        let increment = pointer.x - session.last_pointer.x;
        let update = self.advance(
            session,
            session.accumulator_px + increment,
            session.snapped_day,
        )?;
        session.last_pointer = pointer;
        Ok(update)
    }

    /// The viewport scrolled by `days` under a stationary pointer. The item
    /// follows the pointer, so the accumulator moves by the same amount.
    pub fn on_viewport_shift(&self, session: &mut DragSession, days: i64) -> Result<PointerUpdate> {
        self.ensure_live(session)?;
        let shift_px = days as f64 * session.day_width;
        // The snapped day moves with the axis so hysteresis stays anchored.
        let snapped = session.snapped_day.saturating_add(days);
        self.advance(session, session.accumulator_px + shift_px, snapped)
    }

    /// Apply `rounded_delta` to the session's origin dates.
    ///
    /// On success the delta becomes the last committed one. A rejection
    /// leaves the committed state alone; the caller must not persist.
    pub fn commit(&self, session: &mut DragSession, rounded_delta: i64) -> Result<DateRange> {
        self.ensure_live(session)?;
        self.commit_unchecked(session, rounded_delta)
    }

    fn commit_unchecked(&self, session: &mut DragSession, rounded_delta: i64) -> Result<DateRange> {
        match apply_delta(
            session.origin_dates,
            session.action,
            rounded_delta,
            self.config.min_span_days,
        ) {
            Ok(range) => {
                session.last_committed_delta = rounded_delta;
                session.last_rejected_delta = None;
                session.last_valid_range = range;
                debug!(subject = %session.subject_id, delta = rounded_delta, range = %range, "drag commit");
                Ok(range)
            }
            Err(err) => {
                if err.is_rejection() {
                    session.last_rejected_delta = Some(rounded_delta);
                }
                warn!(subject = %session.subject_id, delta = rounded_delta, %err, "drag commit rejected");
                Err(err)
            }
        }
    }

    /// Finish the drag, committing any outstanding delta first.
    pub fn end(&mut self, mut session: DragSession, had_movement: bool) -> Result<DragOutcome> {
        self.release(&session)?;

        let mut flushed = None;
        let mut rejected = None;
        let pending = session.current_rounded_delta();
        if had_movement && session.wants_commit(pending) {
            match self.commit_unchecked(&mut session, pending) {
                Ok(range) => flushed = Some(range),
                Err(err) => rejected = Some(err),
            }
        }

        let final_range = session.last_valid_range;
        let changed = final_range != session.origin_dates;
        debug!(subject = %session.subject_id, final_range = %final_range, changed, "drag end");
        Ok(DragOutcome {
            subject_id: session.subject_id,
            action: session.action,
            final_range,
            changed,
            flushed,
            rejected,
        })
    }

    /// Abandon the drag. Returns the origin dates the item reverts to.
    pub fn cancel(&mut self, session: DragSession) -> Result<DateRange> {
        self.release(&session)?;
        debug!(subject = %session.subject_id, "drag cancelled");
        Ok(session.origin_dates)
    }

    /// Drop every active drag without touching the sessions. Returns the
    /// subjects that were being dragged.
    pub fn release_all(&mut self) -> Vec<SubjectId> {
        let mut subjects: Vec<SubjectId> = self.active.drain().map(|(subject, _)| subject).collect();
        subjects.sort_unstable();
        if !subjects.is_empty() {
            debug!(count = subjects.len(), "drags released");
        }
        subjects
    }

    fn ensure_live(&self, session: &DragSession) -> Result<()> {
        if self.active.get(&session.subject_id) == Some(&session.epoch) {
            Ok(())
        } else {
            error!(subject = %session.subject_id, "operation on a finished drag session");
            Err(EngineError::InvalidSessionState {
                subject: session.subject_id,
                detail: "no active drag for this session",
            })
        }
    }

    fn release(&mut self, session: &DragSession) -> Result<()> {
        self.ensure_live(session)?;
        self.active.remove(&session.subject_id);
        Ok(())
    }

    fn advance(
        &self,
        session: &mut DragSession,
        accumulator_px: f64,
        snapped_base: i64,
    ) -> Result<PointerUpdate> {
        let raw = accumulator_px / session.day_width;
        if !raw.is_finite() || raw.abs() > MAX_DAY_DELTA {
            return Err(EngineError::invalid_date("drag offset out of range"));
        }

        let (visual, snapped) = match session.mode {
            DisplayMode::Day => {
                let hysteresis_px = self.config.snap_hysteresis * session.day_width;
                let snapped = snap_with_hysteresis(
                    snapped_base,
                    accumulator_px,
                    session.day_width,
                    hysteresis_px,
                );
                (snapped as f64, snapped)
            }
            DisplayMode::Week => (raw, session.snapped_day),
        };
        let rounded = round_day_delta(visual)
            .ok_or(EngineError::invalid_date("drag offset out of range"))?;

        let display_range = apply_delta(
            session.origin_dates,
            session.action,
            rounded,
            self.config.min_span_days,
        )
        .unwrap_or(session.last_valid_range);

        session.accumulator_px = accumulator_px;
        session.visual_delta = visual;
        session.snapped_day = snapped;

        let should_persist = session.wants_commit(rounded);
        trace!(
            subject = %session.subject_id,
            raw,
            visual,
            rounded,
            should_persist,
            "drag move"
        );
        Ok(PointerUpdate {
            visual_delta: visual,
            raw_delta: raw,
            rounded_delta: rounded,
            should_persist,
            display_range,
        })
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Apply a rounded day delta to `origin` for `action`.
pub fn apply_delta(
    origin: DateRange,
    action: DragAction,
    delta: i64,
    min_span_days: i64,
) -> Result<DateRange> {
    if delta == 0 {
        return Ok(origin);
    }
    let candidate = match action {
        DragAction::Move => return origin.shifted(delta),
        DragAction::ResizeStart => DateRange {
            start: crate::range::add_days(origin.start, delta)?,
            end: origin.end,
        },
        DragAction::ResizeEnd => DateRange {
            start: origin.start,
            end: crate::range::add_days(origin.end, delta)?,
        },
    };
    if candidate.span_days() < min_span_days {
        return Err(EngineError::ConstraintViolation {
            action,
            delta,
            start: candidate.start,
            end: candidate.end,
            min_span_days,
        });
    }
    Ok(candidate)
}

/// Pixel position of the column line between day `lower` and `lower + 1`.
///
/// Lines are counted away from the origin so the rule mirrors for left and
/// right drags: 0|1 sits at one column, -1|0 at minus one column.
fn column_line(lower: i64, width: f64) -> f64 {
    let column = if lower >= 0 { lower + 1 } else { lower };
    column as f64 * width
}

/// Day-mode snapping with hysteresis around column lines.
fn snap_with_hysteresis(current: i64, accumulator_px: f64, width: f64, hysteresis_px: f64) -> i64 {
    let mut snapped = current;
    // Large jumps restart two columns short of the target, on the side the
    // pointer came from, so the walk below approaches it in travel order.
    let estimate = (accumulator_px / width).trunc() as i64;
    if estimate > current.saturating_add(2) {
        snapped = estimate - 2;
    } else if estimate < current.saturating_sub(2) {
        snapped = estimate + 2;
    }
    while accumulator_px >= column_line(snapped, width) + hysteresis_px {
        snapped += 1;
    }
    while accumulator_px <= column_line(snapped - 1, width) - hysteresis_px {
        snapped -= 1;
    }
    snapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    fn coordinator() -> DragCoordinator {
        DragCoordinator::new(DragConfig::default(), ColumnWidths::new(40.0, 77.0))
    }

    fn begin(
        coord: &mut DragCoordinator,
        action: DragAction,
        dates: DateRange,
        mode: DisplayMode,
    ) -> DragSession {
        coord
            .begin(
                SubjectId::new(1),
                SubjectKind::Project,
                action,
                dates,
                PointerPosition::new(100.0, 10.0),
                mode,
            )
            .unwrap()
    }

    fn at(x: f64) -> PointerPosition {
        PointerPosition::new(x, 10.0)
    }

    #[test]
    fn day_mode_scenario_with_hysteresis() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);

        let u = coord.on_pointer_move(&mut s, at(145.0)).unwrap();
        assert!((u.raw_delta - 1.125).abs() < 1e-12);
        assert_eq!(u.visual_delta, 0.0);
        assert_eq!(u.rounded_delta, 0);
        assert!(!u.should_persist);

        let u = coord.on_pointer_move(&mut s, at(153.0)).unwrap();
        assert_eq!(u.visual_delta, 1.0);
        assert_eq!(u.rounded_delta, 1);
        assert!(u.should_persist);

        let committed = coord.commit(&mut s, u.rounded_delta).unwrap();
        assert_eq!(committed, range(d(1, 2), d(1, 6)));
    }

    #[test]
    fn hysteresis_is_symmetric_and_sticky() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);

        // Left drags need the same 52px to take the first day.
        assert_eq!(coord.on_pointer_move(&mut s, at(50.0)).unwrap().rounded_delta, 0);
        assert_eq!(coord.on_pointer_move(&mut s, at(47.0)).unwrap().rounded_delta, -1);
        // Back towards the origin: stay until 30% past the -1|0 line.
        assert_eq!(coord.on_pointer_move(&mut s, at(65.0)).unwrap().rounded_delta, -1);
        assert_eq!(coord.on_pointer_move(&mut s, at(72.0)).unwrap().rounded_delta, 0);
        // Right then back: +1 holds until 28px.
        assert_eq!(coord.on_pointer_move(&mut s, at(160.0)).unwrap().rounded_delta, 1);
        assert_eq!(coord.on_pointer_move(&mut s, at(130.0)).unwrap().rounded_delta, 1);
        assert_eq!(coord.on_pointer_move(&mut s, at(127.0)).unwrap().rounded_delta, 0);
    }

    #[test]
    fn large_jump_settles_in_one_move() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(3, 1), d(3, 2)), DisplayMode::Day);
        // 420px is 20px past the 9|10 line and short of the 10|11 line.
        let u = coord.on_pointer_move(&mut s, at(100.0 + 420.0)).unwrap();
        assert_eq!(u.rounded_delta, 10);
        let u = coord.on_pointer_move(&mut s, at(100.0 - 4000.0)).unwrap();
        assert_eq!(u.rounded_delta, -99);
    }

    #[test]
    fn week_mode_fractional_motion() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Week);
        let u = coord.on_pointer_move(&mut s, at(133.0)).unwrap();
        assert!((u.visual_delta - 3.0).abs() < 1e-12);
        assert_eq!(u.rounded_delta, 3);
        let u = coord.on_pointer_move(&mut s, at(138.5)).unwrap();
        assert!((u.visual_delta - 3.5).abs() < 1e-12);
        assert_eq!(u.rounded_delta, 4);
    }

    #[test]
    fn unchanged_rounded_delta_does_not_refire() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Week);
        let u = coord.on_pointer_move(&mut s, at(122.0)).unwrap();
        assert!(u.should_persist);
        coord.commit(&mut s, u.rounded_delta).unwrap();

        let u = coord.on_pointer_move(&mut s, at(123.0)).unwrap();
        assert_eq!(u.rounded_delta, 2);
        assert!(!u.should_persist);
        let u = coord.on_pointer_move(&mut s, at(124.0)).unwrap();
        assert!(!u.should_persist);
    }

    #[test]
    fn resize_end_minimum_span_boundary() {
        let mut coord = coordinator();
        let mut s = begin(
            &mut coord,
            DragAction::ResizeEnd,
            range(d(1, 5), d(1, 8)),
            DisplayMode::Day,
        );
        // end Jan 5 == start: rejected.
        let err = coord.commit(&mut s, -3).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(s.last_committed_delta(), 0);
        // end Jan 6 = start + 1 day: accepted.
        assert_eq!(coord.commit(&mut s, -2).unwrap(), range(d(1, 5), d(1, 6)));
    }

    #[test]
    fn resize_start_minimum_span_boundary() {
        let mut coord = coordinator();
        let mut s = begin(
            &mut coord,
            DragAction::ResizeStart,
            range(d(1, 5), d(1, 8)),
            DisplayMode::Day,
        );
        assert!(coord.commit(&mut s, 3).unwrap_err().is_rejection());
        assert_eq!(coord.commit(&mut s, 2).unwrap(), range(d(1, 7), d(1, 8)));
        assert_eq!(coord.commit(&mut s, -4).unwrap(), range(d(1, 1), d(1, 8)));
    }

    #[test]
    fn rejected_delta_holds_last_valid_range() {
        let mut coord = coordinator();
        let mut s = begin(
            &mut coord,
            DragAction::ResizeEnd,
            range(d(1, 5), d(1, 8)),
            DisplayMode::Week,
        );
        let u = coord.on_pointer_move(&mut s, at(100.0 - 33.0)).unwrap();
        assert_eq!(u.rounded_delta, -3);
        assert!(u.should_persist);
        assert_eq!(u.display_range, range(d(1, 5), d(1, 8)));
        assert!(coord.commit(&mut s, -3).is_err());

        // Same rejected delta does not ask for another commit.
        let u = coord.on_pointer_move(&mut s, at(100.0 - 34.0)).unwrap();
        assert_eq!(u.rounded_delta, -3);
        assert!(!u.should_persist);
    }

    #[test]
    fn commits_anchor_to_origin() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);
        coord.commit(&mut s, 2).unwrap();
        coord.commit(&mut s, 5).unwrap();
        assert_eq!(coord.commit(&mut s, 3).unwrap(), range(d(1, 4), d(1, 8)));
        assert_eq!(s.origin_dates(), range(d(1, 1), d(1, 5)));
    }

    #[test]
    fn end_flushes_outstanding_delta() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Week);
        coord.on_pointer_move(&mut s, at(144.0)).unwrap();
        let outcome = coord.end(s, true).unwrap();
        assert_eq!(outcome.flushed, Some(range(d(1, 5), d(1, 9))));
        assert_eq!(outcome.final_range, range(d(1, 5), d(1, 9)));
        assert!(outcome.changed);
        assert!(!coord.is_dragging(SubjectId::new(1)));
    }

    #[test]
    fn end_without_net_change_reports_unchanged() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Week);
        coord.on_pointer_move(&mut s, at(130.0)).unwrap();
        coord.on_pointer_move(&mut s, at(101.0)).unwrap();
        let outcome = coord.end(s, true).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.flushed, None);
    }

    #[test]
    fn cancel_reverts_to_origin() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);
        coord.on_pointer_move(&mut s, at(300.0)).unwrap();
        coord.commit(&mut s, 5).unwrap();
        assert_eq!(coord.cancel(s).unwrap(), range(d(1, 1), d(1, 5)));
        assert_eq!(coord.active_count(), 0);
    }

    #[test]
    fn nested_drag_on_same_subject_is_refused() {
        let mut coord = coordinator();
        let _s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);
        let err = coord
            .begin(
                SubjectId::new(1),
                SubjectKind::Project,
                DragAction::ResizeEnd,
                range(d(1, 1), d(1, 5)),
                at(0.0),
                DisplayMode::Day,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSessionState { .. }));
        // A different subject is fine.
        assert!(
            coord
                .begin(
                    SubjectId::new(2),
                    SubjectKind::Holiday,
                    DragAction::Move,
                    range(d(2, 1), d(2, 1)),
                    at(0.0),
                    DisplayMode::Day,
                )
                .is_ok()
        );
    }

    #[test]
    fn non_finite_pointer_leaves_session_untouched() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Week);
        coord.on_pointer_move(&mut s, at(122.0)).unwrap();
        let before = s.clone();
        let err = coord.on_pointer_move(&mut s, at(f64::NAN)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDate { .. }));
        assert_eq!(s, before);
    }

    #[test]
    fn viewport_shift_moves_item_with_pointer() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);
        let u = coord.on_viewport_shift(&mut s, 2).unwrap();
        assert_eq!(u.rounded_delta, 2);
        assert!(u.should_persist);
        assert_eq!(s.last_pointer(), s.origin_pointer());
    }

    #[test]
    fn zero_duration_item_can_move() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(4, 1), d(4, 1)), DisplayMode::Day);
        assert_eq!(coord.commit(&mut s, -1).unwrap(), range(d(3, 31), d(3, 31)));
        assert_eq!(coord.commit(&mut s, 0).unwrap(), range(d(4, 1), d(4, 1)));
    }

    #[test]
    fn finished_session_copy_is_refused() {
        let mut coord = coordinator();
        let s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);
        let mut stale = s.clone();
        coord.end(s, false).unwrap();

        let err = coord.on_pointer_move(&mut stale, at(300.0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSessionState { .. }));
        assert!(coord.on_viewport_shift(&mut stale, 2).is_err());
        assert!(coord.commit(&mut stale, 5).is_err());
        assert_eq!(stale.last_committed_delta(), 0);
        assert_eq!(stale.accumulated_px(), 0.0);
        assert!(coord.cancel(stale).is_err());
    }

    #[test]
    fn copy_from_an_earlier_drag_cannot_drive_a_new_one() {
        let mut coord = coordinator();
        let first = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);
        let mut stale = first.clone();
        coord.cancel(first).unwrap();
        let mut live = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);

        assert!(coord.commit(&mut stale, 3).is_err());
        assert!(coord.end(stale, true).is_err());
        assert!(coord.is_dragging(SubjectId::new(1)));
        assert_eq!(coord.commit(&mut live, 3).unwrap(), range(d(1, 4), d(1, 8)));
    }

    #[test]
    fn release_all_forgets_every_drag() {
        let mut coord = coordinator();
        let mut s = begin(&mut coord, DragAction::Move, range(d(1, 1), d(1, 5)), DisplayMode::Day);
        assert_eq!(coord.release_all(), vec![SubjectId::new(1)]);
        assert_eq!(coord.active_count(), 0);
        assert!(coord.on_pointer_move(&mut s, at(200.0)).is_err());
        assert!(coord.release_all().is_empty());
    }

    #[test]
    fn inverted_origin_is_rejected_at_begin() {
        let mut coord = coordinator();
        let err = coord
            .begin(
                SubjectId::new(9),
                SubjectKind::Project,
                DragAction::Move,
                DateRange {
                    start: d(1, 5),
                    end: d(1, 1),
                },
                at(0.0),
                DisplayMode::Day,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvertedRange { .. }));
        assert_eq!(coord.active_count(), 0);
    }
}
