#![forbid(unsafe_code)]

//! Caller-polled timer registry.
//!
//! Nothing here sleeps or spawns. The host calls [`Timers::fire_due`] with
//! the current instant (usually once per frame) and receives the handles
//! whose deadlines have passed, in deadline order. Owners match the handles
//! they hold against that list.
//!
//! # Invariants
//!
//! 1. A cleared handle never fires again; clearing twice returns `false`.
//! 2. Interval timers re-arm from their previous deadline, not from `now`,
//!    so a late poll does not accumulate drift. A poll that is late by more
//!    than one period fires the timer once and skips the missed periods.
//! 3. Periods shorter than [`MIN_PERIOD`] are clamped up to it.

use std::time::Duration;

use tracing::trace;
use web_time::Instant;

/// Shortest period or delay a timer accepts.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Identifies one scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: TimerHandle,
    deadline: Instant,
    /// `Some` for interval timers.
    period: Option<Duration>,
}

/// Registry of one-shot and interval timers.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every `period`, first at `now + period`.
    pub fn set_interval(&mut self, period: Duration, now: Instant) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        self.insert(now + period, Some(period))
    }

    /// Fire once at `now + delay`.
    pub fn set_timeout(&mut self, delay: Duration, now: Instant) -> TimerHandle {
        self.insert(now + delay.max(MIN_PERIOD), None)
    }

    /// Remove a timer. Returns `false` if it was not active.
    pub fn clear(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        let removed = self.entries.len() != before;
        if removed {
            trace!(timer = handle.0, "timer cleared");
        }
        removed
    }

    #[must_use]
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Handles whose deadline is at or before `now`, earliest first.
    ///
    /// One-shots are removed; intervals are re-armed.
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerHandle> {
        let mut due: Vec<(Instant, TimerHandle)> = Vec::new();
        self.entries.retain_mut(|entry| {
            if entry.deadline > now {
                return true;
            }
            due.push((entry.deadline, entry.handle));
            match entry.period {
                Some(period) => {
                    entry.deadline = next_on_grid(entry.deadline, period, now);
                    true
                }
                None => false,
            }
        });
        due.sort();
        if !due.is_empty() {
            trace!(count = due.len(), "timers fired");
        }
        due.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Drop every timer.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    fn insert(&mut self, deadline: Instant, period: Option<Duration>) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.entries.push(Entry {
            handle,
            deadline,
            period,
        });
        trace!(timer = handle.0, ?period, "timer set");
        handle
    }
}

/// First deadline after `now` on the grid `deadline + k * period`.
fn next_on_grid(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let step = period.as_nanos();
    let behind = now.saturating_duration_since(deadline).as_nanos() % step;
    let into_period = u64::try_from(behind).map_or(Duration::ZERO, Duration::from_nanos);
    now + (period - into_period)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn timeout_fires_once() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.set_timeout(ms(100), t0);
        assert!(timers.fire_due(t0 + ms(99)).is_empty());
        assert_eq!(timers.fire_due(t0 + ms(100)), vec![h]);
        assert!(timers.fire_due(t0 + ms(500)).is_empty());
        assert!(!timers.is_active(h));
    }

    #[test]
    fn interval_rearms_without_drift() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.set_interval(ms(150), t0);
        // Polled 40ms late: next deadline is still 300ms, not 340ms.
        assert_eq!(timers.fire_due(t0 + ms(190)), vec![h]);
        assert_eq!(timers.next_deadline(), Some(t0 + ms(300)));
        assert_eq!(timers.fire_due(t0 + ms(300)), vec![h]);
        assert!(timers.is_active(h));
    }

    #[test]
    fn very_late_poll_fires_once_and_skips() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.set_interval(ms(100), t0);
        assert_eq!(timers.fire_due(t0 + ms(1050)), vec![h]);
        assert_eq!(timers.next_deadline(), Some(t0 + ms(1100)));
    }

    #[test]
    fn hours_late_poll_rearms_on_grid() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.set_interval(ms(1), t0);
        let late = t0 + Duration::from_secs(3 * 3600) + Duration::from_micros(500);
        assert_eq!(timers.fire_due(late), vec![h]);
        assert_eq!(
            timers.next_deadline(),
            Some(t0 + Duration::from_secs(3 * 3600) + ms(1))
        );
        assert!(timers.fire_due(late).is_empty());
    }

    #[test]
    fn due_handles_come_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let late = timers.set_timeout(ms(80), t0);
        let early = timers.set_timeout(ms(20), t0);
        let mid = timers.set_interval(ms(50), t0);
        assert_eq!(timers.fire_due(t0 + ms(100)), vec![early, mid, late]);
        assert_eq!(timers.active_count(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.set_interval(ms(10), t0);
        assert!(timers.clear(h));
        assert!(!timers.clear(h));
        assert!(timers.fire_due(t0 + ms(100)).is_empty());
        assert_eq!(timers.active_count(), 0);
    }

    #[test]
    fn zero_period_is_clamped() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let h = timers.set_interval(Duration::ZERO, t0);
        assert!(timers.fire_due(t0).is_empty());
        assert_eq!(timers.fire_due(t0 + MIN_PERIOD), vec![h]);
    }

    #[test]
    fn handles_are_unique() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let a = timers.set_timeout(ms(1), t0);
        timers.clear(a);
        let b = timers.set_timeout(ms(1), t0);
        assert_ne!(a, b);
    }
}
