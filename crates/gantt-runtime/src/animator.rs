#![forbid(unsafe_code)]

//! Eased, cancellable viewport transitions.
//!
//! A [`ViewportAnimator`] moves the viewport start from one date to another
//! over a short duration. It never writes the viewport itself; every
//! [`tick`](ViewportAnimator::tick) yields the interpolated position and the
//! caller applies it.
//!
//! # Invariants
//!
//! 1. At most one run is live. Starting a new run cancels the previous one,
//!    which never emits a completion.
//! 2. A live run holds the animator's viewport write token. Frames carry it,
//!    and the token is released when the run completes or is cancelled.
//! 3. A run whose token stops authorizing (another owner preempted the lock)
//!    is dropped silently on the next tick.
//! 4. `Completed` is emitted exactly once per run, at or after its deadline.
//!
//! # Failure Modes
//!
//! - Lock held by another owner at start: `WriteRejected`, no run created.
//! - Distance under one day: completes immediately without a run.

use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;
use web_time::Instant;

use gantt_core::easing::ease_in_out_cosine;
use gantt_core::range::{add_days, days_between};
use gantt_core::{AnimationConfig, Result, ViewportLock, WriteOwner, WriteToken};

/// Identifies one animation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationHandle(u64);

impl AnimationHandle {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// An intermediate position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub handle: AnimationHandle,
    /// Eased progress in `[0, 1]`.
    pub progress: f64,
    /// Fractional days travelled from the run's origin.
    pub offset_days: f64,
    /// Viewport start to apply for this frame (offset rounded to a day).
    pub start: NaiveDate,
    pub token: WriteToken,
}

/// The definitive end position of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationCompletion {
    /// `None` when no run was created.
    pub handle: Option<AnimationHandle>,
    pub start: NaiveDate,
}

/// Result of asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStart {
    Started(AnimationHandle),
    Completed(AnimationCompletion),
}

/// Emitted by [`ViewportAnimator::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    Frame(AnimationFrame),
    Completed(AnimationCompletion),
}

#[derive(Debug, Clone, Copy)]
struct Run {
    handle: AnimationHandle,
    from: NaiveDate,
    target: NaiveDate,
    distance_days: i64,
    started: Instant,
    duration: Duration,
    token: WriteToken,
}

/// Drives at most one viewport transition at a time.
#[derive(Debug, Clone)]
pub struct ViewportAnimator {
    config: AnimationConfig,
    run: Option<Run>,
    next_id: u64,
}

impl ViewportAnimator {
    #[must_use]
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            run: None,
            next_id: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AnimationConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.run.is_some()
    }

    #[must_use]
    pub fn current(&self) -> Option<AnimationHandle> {
        self.run.map(|r| r.handle)
    }

    /// Target of the live run.
    #[must_use]
    pub fn target(&self) -> Option<NaiveDate> {
        self.run.map(|r| r.target)
    }

    /// Start a transition whose duration scales with the distance.
    pub fn animate_to(
        &mut self,
        lock: &mut ViewportLock,
        current: NaiveDate,
        target: NaiveDate,
        now: Instant,
    ) -> Result<AnimationStart> {
        let days = days_between(current, target).unsigned_abs();
        let duration = self.config.duration_for(days);
        self.animate_to_with(lock, current, target, duration, now)
    }

    /// Start a transition with an explicit duration.
    pub fn animate_to_with(
        &mut self,
        lock: &mut ViewportLock,
        current: NaiveDate,
        target: NaiveDate,
        duration: Duration,
        now: Instant,
    ) -> Result<AnimationStart> {
        self.drop_run(lock, "superseded");

        let distance_days = days_between(current, target);
        if distance_days == 0 {
            return Ok(AnimationStart::Completed(AnimationCompletion {
                handle: None,
                start: target,
            }));
        }

        let token = lock.try_acquire(WriteOwner::Animator)?;
        self.next_id += 1;
        let handle = AnimationHandle(self.next_id);
        self.run = Some(Run {
            handle,
            from: current,
            target,
            distance_days,
            started: now,
            duration,
            token,
        });
        debug!(
            run = handle.0,
            from = %current,
            to = %target,
            ?duration,
            "viewport animation started"
        );
        Ok(AnimationStart::Started(handle))
    }

    /// Advance the live run to `now`.
    pub fn tick(&mut self, lock: &mut ViewportLock, now: Instant) -> Option<AnimationEvent> {
        let run = self.run?;
        if lock.authorize(&run.token).is_err() {
            self.run = None;
            debug!(run = run.handle.0, holder = ?lock.holder(), "viewport animation preempted");
            return None;
        }

        let elapsed = now.saturating_duration_since(run.started);
        if elapsed >= run.duration {
            self.run = None;
            lock.release(run.token);
            debug!(run = run.handle.0, start = %run.target, "viewport animation completed");
            return Some(AnimationEvent::Completed(AnimationCompletion {
                handle: Some(run.handle),
                start: run.target,
            }));
        }

        let t = elapsed.as_secs_f64() / run.duration.as_secs_f64();
        let progress = ease_in_out_cosine(t);
        let offset_days = progress * run.distance_days as f64;
        let start = add_days(run.from, offset_days.round() as i64).unwrap_or(run.target);
        Some(AnimationEvent::Frame(AnimationFrame {
            handle: run.handle,
            progress,
            offset_days,
            start,
            token: run.token,
        }))
    }

    /// Stop `handle` where it is. Returns `false` if it is not the live run.
    pub fn cancel(&mut self, lock: &mut ViewportLock, handle: AnimationHandle) -> bool {
        if self.current() != Some(handle) {
            return false;
        }
        self.drop_run(lock, "cancelled");
        true
    }

    /// Cancel any run and settle on `target` at once.
    pub fn jump_to(&mut self, lock: &mut ViewportLock, target: NaiveDate) -> AnimationCompletion {
        let handle = self.current();
        self.drop_run(lock, "jumped");
        AnimationCompletion {
            handle,
            start: target,
        }
    }

    fn drop_run(&mut self, lock: &mut ViewportLock, reason: &'static str) {
        if let Some(run) = self.run.take() {
            lock.release(run.token);
            debug!(run = run.handle.0, reason, "viewport animation stopped");
        }
    }
}
