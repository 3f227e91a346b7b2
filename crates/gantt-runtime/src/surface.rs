#![forbid(unsafe_code)]

//! The drag surface: one object that wires drag sessions, edge auto-scroll,
//! viewport animation, and throttled persistence together.
//!
//! The host forwards pointer events and calls [`DragSurface::tick`] once per
//! frame. Every operation returns the [`SurfaceEvent`]s it produced, in the
//! order they happened; the host renders `Visual` updates, applies
//! `Viewport` proposals to its own viewport state, and reports persistence
//! outcomes.
//!
//! # Lifecycle
//!
//! ```text
//! pointer_down ─► pointer_move* ─► pointer_up   (flush pending write)
//!                              ├─► cancel       (discard pending write)
//!                              └─► teardown     (cancel, then stop all)
//! ```
//!
//! # Invariants
//!
//! 1. Writes during a drag go through the throttler with
//!    [`UpdateOptions::SILENT`]. A write issued at pointer-up notifies. When
//!    the last throttled write already ran, pointer-up writes nothing and
//!    [`DragOutcome::changed`] is the caller's cue to notify.
//! 2. `pointer_up` always flushes the subject's pending write before
//!    returning. `cancel` and `teardown` always discard it.
//! 3. After `pointer_up`, `cancel`, or `teardown` the auto-scroll timer is
//!    gone. After `teardown` no subject is being dragged.
//! 4. Viewport proposals are only emitted while the animator's token
//!    authorizes against the surface's [`ViewportLock`].

use std::collections::HashSet;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::{debug, warn};
use web_time::Instant;

use gantt_core::range::add_days;
use gantt_core::{
    DateRange, DisplayMode, DragAction, DragCoordinator, DragOutcome, DragSession, EngineConfig,
    EngineError, NavigationTarget, PointerPosition, PointerUpdate, Result, SubjectId,
    SubjectKind, ViewportLock, ViewportState, WriteOwner, WriteToken,
};

use crate::animator::{AnimationEvent, AnimationStart, ViewportAnimator};
use crate::autoscroll::{AutoScrollController, ScrollBounds, ScrollDirective};
use crate::sink::{DatePatch, DateSink, PersistenceError, UpdateOptions};
use crate::throttle::{PersistenceThrottler, Thunk};
use crate::timer::Timers;

/// What a deferred write reports back: the range it wrote and the sink's
/// answer.
type WriteResult = (DateRange, std::result::Result<(), PersistenceError>);

/// Something the host should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// New on-screen placement for the dragged bar.
    Visual {
        subject: SubjectId,
        update: PointerUpdate,
    },
    /// A commit broke a date rule; the bar stays at its last valid range.
    CommitRejected {
        subject: SubjectId,
        error: EngineError,
    },
    /// The sink accepted a write.
    Persisted { subject: SubjectId, range: DateRange },
    /// The sink refused a write. The visual state is kept.
    PersistenceFailed {
        subject: SubjectId,
        range: DateRange,
        error: PersistenceError,
    },
    /// Intermediate viewport start from an animation frame.
    Viewport { start: NaiveDate, token: WriteToken },
    /// Final viewport start of a transition.
    ViewportSettled { start: NaiveDate },
    /// Auto-scroll started, switched direction, or stopped.
    AutoScroll(ScrollDirective),
    /// The drag ended normally.
    DragFinished(DragOutcome),
    /// The drag was abandoned; the bar reverts to `origin`.
    DragCancelled {
        subject: SubjectId,
        origin: DateRange,
    },
}

/// Orchestrates drags, auto-scroll, animation, and persistence for one
/// timeline surface.
pub struct DragSurface<S: DateSink> {
    config: EngineConfig,
    coordinator: DragCoordinator,
    auto_scroll: AutoScrollController,
    animator: ViewportAnimator,
    throttler: PersistenceThrottler<SubjectId, WriteResult>,
    timers: Timers,
    lock: ViewportLock,
    sink: Rc<S>,
    /// Subjects whose active drag already reached the sink.
    written: HashSet<SubjectId>,
}

impl<S: DateSink> std::fmt::Debug for DragSurface<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragSurface")
            .field("dragging", &self.coordinator.active_count())
            .field("auto_scroll", &self.auto_scroll.state())
            .field("animating", &self.animator.is_animating())
            .field("pending_writes", &self.throttler.pending_count())
            .field("lock", &self.lock.holder())
            .finish_non_exhaustive()
    }
}

impl<S: DateSink + 'static> DragSurface<S> {
    #[must_use]
    pub fn new(config: EngineConfig, sink: Rc<S>) -> Self {
        Self {
            coordinator: DragCoordinator::new(config.drag, config.widths),
            auto_scroll: AutoScrollController::new(config.auto_scroll),
            animator: ViewportAnimator::new(config.animation),
            throttler: PersistenceThrottler::new(),
            timers: Timers::new(),
            lock: ViewportLock::new(),
            sink,
            written: HashSet::new(),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn coordinator(&self) -> &DragCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub const fn timers(&self) -> &Timers {
        &self.timers
    }

    #[must_use]
    pub const fn lock(&self) -> &ViewportLock {
        &self.lock
    }

    // -----------------------------------------------------------------------
    // Flags
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    #[must_use]
    pub const fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.is_scrolling()
    }

    #[must_use]
    pub fn has_pending_writes(&self) -> bool {
        self.throttler.pending_count() > 0
    }

    /// Earliest instant at which `tick` has timer or write work to do.
    /// Animation frames are not included; tick every frame while
    /// [`is_animating`](Self::is_animating).
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timers.next_deadline(), self.throttler.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // -----------------------------------------------------------------------
    // Pointer
    // -----------------------------------------------------------------------

    /// Start dragging `subject`.
    pub fn pointer_down(
        &mut self,
        subject: SubjectId,
        kind: SubjectKind,
        action: DragAction,
        origin_dates: DateRange,
        pointer: PointerPosition,
        mode: DisplayMode,
    ) -> Result<DragSession> {
        let session = self
            .coordinator
            .begin(subject, kind, action, origin_dates, pointer, mode)?;
        self.written.remove(&subject);
        Ok(session)
    }

    /// Feed a pointer move. Non-finite coordinates fail without side effects.
    pub fn pointer_move(
        &mut self,
        session: &mut DragSession,
        pointer: PointerPosition,
        bounds: ScrollBounds,
        now: Instant,
    ) -> Result<Vec<SurfaceEvent>> {
        let update = self.coordinator.on_pointer_move(session, pointer)?;
        let mut events = Vec::new();
        self.apply_update(session, update, now, &mut events);

        let before = self.auto_scroll.state().direction;
        let directive = self
            .auto_scroll
            .check_and_update(pointer, bounds, &mut self.timers, now);
        if directive.direction() != before {
            events.push(SurfaceEvent::AutoScroll(directive));
        }
        Ok(events)
    }

    /// Finish the drag: commit any outstanding delta and write it now.
    pub fn pointer_up(&mut self, session: DragSession, now: Instant) -> Result<Vec<SurfaceEvent>> {
        let had_movement =
            session.accumulated_px() != 0.0 || session.last_pointer() != session.origin_pointer();
        let subject = session.subject_id();
        let kind = session.subject_kind();
        let outcome = self.coordinator.end(session, had_movement)?;

        let mut events = Vec::new();
        self.stop_auto_scroll(&mut events);

        if let Some(error) = outcome.rejected.clone() {
            events.push(SurfaceEvent::CommitRejected { subject, error });
        }
        // The last write of a drag notifies, whether it is new or was pending.
        let final_write = outcome.flushed.or_else(|| {
            self.throttler
                .has_pending(&subject)
                .then_some(outcome.final_range)
        });
        if let Some(range) = final_write {
            let thunk = self.write_thunk(subject, kind, outcome.action, range, UpdateOptions::NOTIFY);
            self.throttler.schedule(subject, thunk, self.config.persistence.min_interval(), now);
        }
        if let Some(result) = self.throttler.flush(&subject) {
            push_write_result(subject, result, &mut events);
        }
        self.written.remove(&subject);

        debug!(subject = %subject, changed = outcome.changed, "drag finished");
        events.push(SurfaceEvent::DragFinished(outcome));
        Ok(events)
    }

    /// Abandon the drag. The pending write is discarded; if an earlier write
    /// of this drag already reached the sink, the origin dates are written
    /// back.
    pub fn cancel(&mut self, session: DragSession) -> Result<Vec<SurfaceEvent>> {
        let subject = session.subject_id();
        let kind = session.subject_kind();
        let origin = self.coordinator.cancel(session)?;

        let mut events = Vec::new();
        self.stop_auto_scroll(&mut events);
        self.throttler.clear(&subject);

        if self.written.remove(&subject) {
            let result = self.sink.update_subject_dates(
                subject,
                kind,
                DatePatch::full(origin),
                UpdateOptions::SILENT,
            );
            push_write_result(subject, (origin, result), &mut events);
        }
        events.push(SurfaceEvent::DragCancelled { subject, origin });
        Ok(events)
    }

    // -----------------------------------------------------------------------
    // Viewport
    // -----------------------------------------------------------------------

    /// Animate the viewport towards a navigation target.
    pub fn navigate(
        &mut self,
        target: NavigationTarget,
        viewport: &ViewportState,
        now: Instant,
    ) -> Result<Vec<SurfaceEvent>> {
        let start = self.config.navigation.resolve(viewport, target)?;
        debug!(?target, from = %viewport.start, to = %start, "navigate");
        match self
            .animator
            .animate_to(&mut self.lock, viewport.start, start, now)?
        {
            AnimationStart::Started(_) => Ok(Vec::new()),
            AnimationStart::Completed(done) => {
                Ok(vec![SurfaceEvent::ViewportSettled { start: done.start }])
            }
        }
    }

    /// Take viewport writes for a scrollbar drag. Any animation in flight
    /// stops on the next tick.
    pub fn grab_scrollbar(&mut self) -> WriteToken {
        self.lock.preempt(WriteOwner::Scrollbar)
    }

    /// End a scrollbar drag.
    pub fn release_scrollbar(&mut self, token: WriteToken) -> bool {
        self.lock.release(token)
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advance timers, animation, and throttled writes to `now`.
    ///
    /// `session` is the drag in progress, if any; auto-scroll ticks shift it
    /// along with the viewport.
    pub fn tick(
        &mut self,
        now: Instant,
        mut session: Option<&mut DragSession>,
        viewport: &ViewportState,
    ) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();

        for handle in self.timers.fire_due(now) {
            let Some(session) = session.as_deref_mut() else {
                // Auto-scroll outlived its drag.
                self.stop_auto_scroll(&mut events);
                continue;
            };
            if let Some(days) = self.auto_scroll.on_timer(handle, session.mode()) {
                self.auto_scroll_step(session, days, viewport, now, &mut events);
            }
        }

        match self.animator.tick(&mut self.lock, now) {
            Some(AnimationEvent::Frame(frame)) => events.push(SurfaceEvent::Viewport {
                start: frame.start,
                token: frame.token,
            }),
            Some(AnimationEvent::Completed(done)) => {
                events.push(SurfaceEvent::ViewportSettled { start: done.start });
            }
            None => {}
        }

        for (subject, result) in self.throttler.poll(now) {
            if result.1.is_ok() && self.coordinator.is_dragging(subject) {
                self.written.insert(subject);
            }
            push_write_result(subject, result, &mut events);
        }
        events
    }

    /// Stop everything, as when the surface goes away mid-gesture.
    ///
    /// `session` is the drag in progress, if any; it is cancelled exactly as
    /// [`cancel`](Self::cancel) would. Pending writes are discarded, and
    /// drags whose sessions the host no longer holds are released.
    pub fn teardown(&mut self, session: Option<DragSession>) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        if let Some(session) = session {
            match self.cancel(session) {
                Ok(cancelled) => events.extend(cancelled),
                Err(err) => warn!(%err, "drag not cancelled during teardown"),
            }
        }
        self.stop_auto_scroll(&mut events);
        self.timers.clear_all();
        if let Some(handle) = self.animator.current() {
            self.animator.cancel(&mut self.lock, handle);
        }
        let discarded = self.throttler.clear_all();
        let released = self.coordinator.release_all();
        self.written.clear();
        debug!(discarded, released = released.len(), "drag surface torn down");
        events
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn apply_update(
        &mut self,
        session: &mut DragSession,
        update: PointerUpdate,
        now: Instant,
        events: &mut Vec<SurfaceEvent>,
    ) {
        let subject = session.subject_id();
        events.push(SurfaceEvent::Visual { subject, update });
        if !update.should_persist {
            return;
        }
        match self.coordinator.commit(session, update.rounded_delta) {
            Ok(range) => {
                let thunk = self.write_thunk(
                    subject,
                    session.subject_kind(),
                    session.action(),
                    range,
                    UpdateOptions::SILENT,
                );
                self.throttler
                    .schedule(subject, thunk, self.config.persistence.min_interval(), now);
            }
            Err(error) => events.push(SurfaceEvent::CommitRejected { subject, error }),
        }
    }

    fn auto_scroll_step(
        &mut self,
        session: &mut DragSession,
        days: i64,
        viewport: &ViewportState,
        now: Instant,
        events: &mut Vec<SurfaceEvent>,
    ) {
        let base = self.animator.target().unwrap_or(viewport.start);
        let Ok(target) = add_days(base, days) else {
            warn!(%base, days, "auto-scroll target out of range");
            return;
        };
        let period = self.config.auto_scroll.period();
        if let Err(err) = self
            .animator
            .animate_to_with(&mut self.lock, viewport.start, target, period, now)
        {
            debug!(%err, "auto-scroll step skipped");
            return;
        }
        match self.coordinator.on_viewport_shift(session, days) {
            Ok(update) => self.apply_update(session, update, now, events),
            Err(err) => warn!(subject = %session.subject_id(), %err, "viewport shift not applied"),
        }
    }

    fn stop_auto_scroll(&mut self, events: &mut Vec<SurfaceEvent>) {
        if self.auto_scroll.stop(&mut self.timers) {
            events.push(SurfaceEvent::AutoScroll(ScrollDirective::Stop));
        }
    }

    fn write_thunk(
        &self,
        subject: SubjectId,
        kind: SubjectKind,
        action: DragAction,
        range: DateRange,
        options: UpdateOptions,
    ) -> Thunk<WriteResult> {
        let sink = Rc::clone(&self.sink);
        Box::new(move || {
            let patch = DatePatch::for_action(action, range);
            let result = sink.update_subject_dates(subject, kind, patch, options);
            (range, result)
        })
    }
}

fn push_write_result(subject: SubjectId, (range, result): WriteResult, events: &mut Vec<SurfaceEvent>) {
    match result {
        Ok(()) => {
            debug!(subject = %subject, %range, "dates persisted");
            events.push(SurfaceEvent::Persisted { subject, range });
        }
        Err(error) => {
            warn!(subject = %subject, %range, %error, "persisting dates failed");
            events.push(SurfaceEvent::PersistenceFailed {
                subject,
                range,
                error,
            });
        }
    }
}
