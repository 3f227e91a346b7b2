#![forbid(unsafe_code)]

//! Viewport window over the date axis, and the write lock guarding it.
//!
//! The caller owns the canonical [`ViewportState`]; engine components only
//! read snapshots and propose new start dates. Proposals are tagged with a
//! [`WriteToken`] issued by a [`ViewportLock`]. Whoever currently owns
//! viewport writes (an animation run, a scrollbar drag) holds the token, and
//! any proposal presenting a stale or foreign token is refused.
//!
//! # Invariants
//!
//! 1. At most one owner holds the lock at a time.
//! 2. Re-acquiring by the same owner bumps the generation; the previous token
//!    stops authorizing.
//! 3. Releasing with a stale token is a no-op.
//! 4. `preempt` always succeeds and invalidates whatever token was current.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Visible window of the date axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportState {
    pub start: NaiveDate,
    pub length_days: u32,
}

impl ViewportState {
    #[must_use]
    pub const fn new(start: NaiveDate, length_days: u32) -> Self {
        Self { start, length_days }
    }
}

// ---------------------------------------------------------------------------
// Write lock
// ---------------------------------------------------------------------------

/// Components that may own viewport writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOwner {
    /// An eased navigation or auto-scroll run.
    Animator,
    /// A scrollbar thumb drag.
    Scrollbar,
    /// Direct writes from the host (keyboard, wheel).
    Host,
}

/// Proof of current viewport-write ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteToken {
    owner: WriteOwner,
    generation: u64,
}

impl WriteToken {
    #[must_use]
    pub const fn owner(&self) -> WriteOwner {
        self.owner
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Exclusive ownership of viewport writes.
#[derive(Debug, Clone, Default)]
pub struct ViewportLock {
    current: Option<WriteToken>,
    generation: u64,
}

impl ViewportLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `owner`.
    ///
    /// Fails if another owner holds it. The same owner may re-acquire, which
    /// invalidates its previous token.
    pub fn try_acquire(&mut self, owner: WriteOwner) -> Result<WriteToken> {
        if let Some(held) = self.current
            && held.owner != owner
        {
            return Err(EngineError::WriteRejected {
                holder: Some(held.owner),
            });
        }
        self.generation = self.generation.wrapping_add(1);
        let token = WriteToken {
            owner,
            generation: self.generation,
        };
        self.current = Some(token);
        debug!(?owner, generation = token.generation, "viewport lock acquired");
        Ok(token)
    }

    /// Take the lock for `owner` regardless of the current holder, whose
    /// token stops authorizing. Used by direct manipulation (a scrollbar
    /// grab) that must win over an animation in flight.
    pub fn preempt(&mut self, owner: WriteOwner) -> WriteToken {
        if let Some(held) = self.current.take()
            && held.owner != owner
        {
            debug!(from = ?held.owner, to = ?owner, "viewport lock preempted");
        }
        self.generation = self.generation.wrapping_add(1);
        let token = WriteToken {
            owner,
            generation: self.generation,
        };
        self.current = Some(token);
        token
    }

    /// Give the lock back. Returns `false` if `token` was not current.
    pub fn release(&mut self, token: WriteToken) -> bool {
        if self.current == Some(token) {
            self.current = None;
            debug!(owner = ?token.owner, generation = token.generation, "viewport lock released");
            true
        } else {
            false
        }
    }

    /// Check that `token` may write right now.
    pub fn authorize(&self, token: &WriteToken) -> Result<()> {
        match self.current {
            Some(held) if held == *token => Ok(()),
            held => Err(EngineError::WriteRejected {
                holder: held.map(|t| t.owner),
            }),
        }
    }

    #[must_use]
    pub fn holder(&self) -> Option<WriteOwner> {
        self.current.map(|t| t.owner)
    }

    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.current.is_some()
    }
}
