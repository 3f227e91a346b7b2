#![forbid(unsafe_code)]

//! Per-key write coalescing with a minimum interval.
//!
//! [`PersistenceThrottler`] sits between a drag and the external date sink.
//! Rapid commits for one subject collapse into a single deferred write: the
//! most recently scheduled thunk wins and runs once the window opened by
//! the first pending schedule has elapsed.
//!
//! # Invariants
//!
//! 1. At most one thunk is pending per key.
//! 2. A pending thunk runs no earlier than `min_interval` after the schedule
//!    that opened its window. Re-scheduling replaces the thunk but keeps the
//!    deadline.
//! 3. A thunk removed by [`clear`](PersistenceThrottler::clear) never runs.
//! 4. [`flush`](PersistenceThrottler::flush) runs the pending thunk
//!    synchronously and closes the window.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use gantt_runtime::throttle::PersistenceThrottler;
//! use web_time::Instant;
//!
//! let t0 = Instant::now();
//! let mut throttler: PersistenceThrottler<u32, i32> = PersistenceThrottler::new();
//! let window = Duration::from_millis(250);
//! throttler.schedule(7, Box::new(|| 1), window, t0);
//! throttler.schedule(7, Box::new(|| 2), window, t0);
//! assert!(throttler.poll(t0).is_empty());
//! assert_eq!(throttler.poll(t0 + window), vec![(7, 2)]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use tracing::trace;
use web_time::Instant;

/// Deferred write.
pub type Thunk<R> = Box<dyn FnOnce() -> R>;

struct Pending<R> {
    thunk: Thunk<R>,
    deadline: Instant,
    coalesced: u32,
}

/// Latest-wins, rate-limited executor keyed by subject.
pub struct PersistenceThrottler<K, R> {
    pending: HashMap<K, Pending<R>>,
}

impl<K, R> fmt::Debug for PersistenceThrottler<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceThrottler")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl<K, R> Default for PersistenceThrottler<K, R> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<K, R> PersistenceThrottler<K, R>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `thunk` for `key`, replacing any thunk already pending.
    pub fn schedule(&mut self, key: K, thunk: Thunk<R>, min_interval: Duration, now: Instant) {
        match self.pending.get_mut(&key) {
            Some(slot) => {
                slot.thunk = thunk;
                slot.coalesced += 1;
                trace!(?key, coalesced = slot.coalesced, "write coalesced");
            }
            None => {
                let deadline = now + min_interval;
                trace!(?key, ?min_interval, "write scheduled");
                self.pending.insert(
                    key,
                    Pending {
                        thunk,
                        deadline,
                        coalesced: 0,
                    },
                );
            }
        }
    }

    /// Run every thunk whose window has elapsed, earliest deadline first.
    pub fn poll(&mut self, now: Instant) -> Vec<(K, R)> {
        let mut due: Vec<(Instant, K)> = self
            .pending
            .iter()
            .filter(|(_, slot)| slot.deadline <= now)
            .map(|(key, slot)| (slot.deadline, key.clone()))
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0));
        due.into_iter()
            .filter_map(|(_, key)| self.run(key))
            .collect()
    }

    /// Run the pending thunk for `key` now, if any.
    pub fn flush(&mut self, key: &K) -> Option<R> {
        self.run(key.clone()).map(|(_, result)| result)
    }

    /// Discard the pending thunk for `key`. Returns `true` if one was pending.
    pub fn clear(&mut self, key: &K) -> bool {
        let removed = self.pending.remove(key).is_some();
        if removed {
            trace!(?key, "pending write cleared");
        }
        removed
    }

    /// Run every pending thunk now, earliest deadline first.
    pub fn flush_all(&mut self) -> Vec<(K, R)> {
        let mut keys: Vec<(Instant, K)> = self
            .pending
            .iter()
            .map(|(key, slot)| (slot.deadline, key.clone()))
            .collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        keys.into_iter()
            .filter_map(|(_, key)| self.run(key))
            .collect()
    }

    /// Discard everything. Returns how many thunks were dropped.
    pub fn clear_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    #[must_use]
    pub fn has_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// When the next [`poll`](Self::poll) would run something.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|slot| slot.deadline).min()
    }

    fn run(&mut self, key: K) -> Option<(K, R)> {
        let slot = self.pending.remove(&key)?;
        trace!(?key, coalesced = slot.coalesced, "write executed");
        let result = (slot.thunk)();
        Some((key, result))
    }
}
