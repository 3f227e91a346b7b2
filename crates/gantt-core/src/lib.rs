#![forbid(unsafe_code)]

//! Core: unit conversion, drag sessions, viewport state, and navigation.
//!
//! # Role in the engine
//! `gantt-core` is the input-side layer of the timeline drag engine. It turns
//! pointer motion into calendar-day deltas and validated date commits, and
//! defines the viewport window and the lock that guards writes to it.
//! Nothing here knows about time passing; every function is driven by the
//! values passed in.
//!
//! # Primary responsibilities
//! - **units**: pixel ↔ day conversion for Day and Week display modes.
//! - **drag**: [`DragCoordinator`] and the caller-owned [`DragSession`].
//! - **viewport**: [`ViewportState`] and the [`ViewportLock`] write tokens.
//! - **navigation**: target viewport starts for today / prev / next / search.
//! - **easing**: the cosine transition curve used by the animator.
//! - **config**: [`EngineConfig`], loadable from TOML.
//!
//! # How it fits in the system
//! `gantt-runtime` owns everything clock-driven (timers, throttled
//! persistence, auto-scroll, animation) and builds on these types.

pub mod config;
pub mod drag;
pub mod easing;
pub mod error;
pub mod navigation;
pub mod range;
pub mod units;
pub mod viewport;

pub use config::{AnimationConfig, AutoScrollConfig, ConfigError, EngineConfig, PersistenceConfig};
pub use drag::{
    DragAction, DragConfig, DragCoordinator, DragOutcome, DragSession, PointerPosition,
    PointerUpdate, SubjectId, SubjectKind,
};
pub use error::{EngineError, Result};
pub use navigation::{NavigationConfig, NavigationTarget};
pub use range::DateRange;
pub use units::{ColumnWidths, DisplayMode, day_delta_to_pixels, pixels_to_day_delta};
pub use viewport::{ViewportLock, ViewportState, WriteOwner, WriteToken};
