#![forbid(unsafe_code)]

//! Edge auto-scroll while dragging.
//!
//! When the pointer comes within `edge_threshold_px` of the left or right
//! edge of the timeline surface, the controller starts one interval timer.
//! Each tick of that timer asks the caller to shift the viewport by a fixed
//! number of days in the matching direction. Leaving the edge zone, or
//! calling [`AutoScrollController::stop`], clears the timer.
//!
//! # Invariants
//!
//! 1. The controller owns at most one timer at any time. A direction change
//!    clears the old timer before the new one is set.
//! 2. `stop` is idempotent; after it returns the controller owns no timer.
//! 3. Ticks of foreign or stale handles are ignored.

use tracing::debug;
use web_time::Instant;

use gantt_core::{AutoScrollConfig, DisplayMode, PointerPosition};

use crate::timer::{TimerHandle, Timers};

/// Which way the viewport is scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Towards earlier dates.
    Left,
    /// Towards later dates.
    Right,
}

impl ScrollDirection {
    /// `-1` for left, `+1` for right.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// What the controller decided for the latest pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirective {
    Left,
    Right,
    Stop,
}

impl ScrollDirective {
    #[must_use]
    pub const fn direction(self) -> Option<ScrollDirection> {
        match self {
            Self::Left => Some(ScrollDirection::Left),
            Self::Right => Some(ScrollDirection::Right),
            Self::Stop => None,
        }
    }
}

/// Horizontal extent of the scrollable surface, with an optional vertical
/// band outside of which edge proximity is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollBounds {
    pub left: f64,
    pub right: f64,
    pub band: Option<(f64, f64)>,
}

impl ScrollBounds {
    #[must_use]
    pub const fn new(left: f64, right: f64) -> Self {
        Self {
            left,
            right,
            band: None,
        }
    }

    /// Only scroll while `top <= y <= bottom`.
    #[must_use]
    pub fn with_vertical_band(mut self, top: f64, bottom: f64) -> Self {
        self.band = Some((top, bottom));
        self
    }

    fn in_band(&self, y: f64) -> bool {
        self.band.is_none_or(|(top, bottom)| (top..=bottom).contains(&y))
    }
}

/// Snapshot of the controller for hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoScrollState {
    pub direction: Option<ScrollDirection>,
    pub timer: Option<TimerHandle>,
}

impl AutoScrollState {
    #[must_use]
    pub const fn is_scrolling(&self) -> bool {
        self.direction.is_some()
    }
}

/// Edge detector plus the interval timer it owns.
#[derive(Debug, Clone)]
pub struct AutoScrollController {
    config: AutoScrollConfig,
    active: Option<(ScrollDirection, TimerHandle)>,
}

impl AutoScrollController {
    #[must_use]
    pub const fn new(config: AutoScrollConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AutoScrollConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> AutoScrollState {
        AutoScrollState {
            direction: self.active.map(|(d, _)| d),
            timer: self.active.map(|(_, t)| t),
        }
    }

    #[must_use]
    pub const fn is_scrolling(&self) -> bool {
        self.active.is_some()
    }

    /// Classify `pointer` against `bounds` without touching any timer.
    #[must_use]
    pub fn classify(&self, pointer: PointerPosition, bounds: ScrollBounds) -> ScrollDirective {
        if !pointer.is_finite() || !bounds.in_band(pointer.y) {
            return ScrollDirective::Stop;
        }
        let threshold = self.config.edge_threshold_px;
        if pointer.x - bounds.left < threshold {
            ScrollDirective::Left
        } else if bounds.right - pointer.x < threshold {
            ScrollDirective::Right
        } else {
            ScrollDirective::Stop
        }
    }

    /// Re-evaluate the pointer and start, switch, or stop the timer.
    pub fn check_and_update(
        &mut self,
        pointer: PointerPosition,
        bounds: ScrollBounds,
        timers: &mut Timers,
        now: Instant,
    ) -> ScrollDirective {
        let directive = self.classify(pointer, bounds);
        match directive.direction() {
            None => {
                self.stop(timers);
            }
            Some(direction) if self.active.map(|(d, _)| d) == Some(direction) => {}
            Some(direction) => {
                self.stop(timers);
                let timer = timers.set_interval(self.config.period(), now);
                self.active = Some((direction, timer));
                debug!(?direction, timer = timer.id(), "auto-scroll started");
            }
        }
        directive
    }

    /// Signed day shift for a tick of `handle`, or `None` if the handle is
    /// not the one this controller owns.
    #[must_use]
    pub fn on_timer(&self, handle: TimerHandle, mode: DisplayMode) -> Option<i64> {
        match self.active {
            Some((direction, owned)) if owned == handle => {
                Some(direction.sign() * i64::from(self.config.step_days(mode)))
            }
            _ => None,
        }
    }

    /// Clear the owned timer. Returns `true` if one was running.
    pub fn stop(&mut self, timers: &mut Timers) -> bool {
        match self.active.take() {
            Some((direction, timer)) => {
                timers.clear(timer);
                debug!(?direction, timer = timer.id(), "auto-scroll stopped");
                true
            }
            None => false,
        }
    }
}
