#![forbid(unsafe_code)]

//! Runtime: the clock-driven half of the timeline drag engine.
//!
//! # Role in the engine
//! `gantt-runtime` owns everything that depends on time passing: interval
//! and one-shot timers, rate-limited persistence, edge auto-scroll, and
//! eased viewport transitions. It never reads a clock itself; the host
//! passes `now` into every call, which keeps behavior reproducible in tests.
//!
//! # Primary responsibilities
//! - **timer**: [`Timers`], a caller-polled registry.
//! - **throttle**: [`PersistenceThrottler`], latest-wins per-key writes.
//! - **autoscroll**: [`AutoScrollController`], edge detection plus one timer.
//! - **animator**: [`ViewportAnimator`], one cancellable eased run at a time.
//! - **surface**: [`DragSurface`], which wires the above to a [`DateSink`].
//!
//! # How it fits in the system
//! Pure drag and viewport logic lives in `gantt-core`; this crate re-exports
//! the types a host needs alongside its own.

pub mod animator;
pub mod autoscroll;
pub mod sink;
pub mod surface;
pub mod throttle;
pub mod timer;

pub use animator::{
    AnimationCompletion, AnimationEvent, AnimationFrame, AnimationHandle, AnimationStart,
    ViewportAnimator,
};
pub use autoscroll::{
    AutoScrollController, AutoScrollState, ScrollBounds, ScrollDirection, ScrollDirective,
};
pub use sink::{DatePatch, DateSink, PersistenceError, UpdateOptions};
pub use surface::{DragSurface, SurfaceEvent};
pub use throttle::PersistenceThrottler;
pub use timer::{TimerHandle, Timers};

pub use gantt_core as core;
