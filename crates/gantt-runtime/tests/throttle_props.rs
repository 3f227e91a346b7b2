//! Property tests for the persistence throttler and timer registry.
//!
//! ## Invariants
//!
//! 1. Latest wins: every executed thunk is the most recent one scheduled
//!    before it ran.
//! 2. Rate limit: two executions for one key are at least `min_interval`
//!    apart when only `poll` drives them.
//! 3. Nothing is lost: after a final `flush`, the last scheduled value has
//!    executed exactly once.
//! 4. Interval timers fire once per poll at most, never early.

use std::time::Duration;

use gantt_runtime::{PersistenceThrottler, Timers};
use proptest::prelude::*;
use web_time::Instant;

#[derive(Debug, Clone)]
enum Op {
    Schedule(u32),
    Poll,
}

fn arb_ops() -> impl Strategy<Value = Vec<(u64, Op)>> {
    prop::collection::vec(
        (
            0u64..80,
            prop_oneof![3 => any::<u32>().prop_map(Op::Schedule), 1 => Just(Op::Poll)],
        ),
        1..80,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn latest_wins_and_rate_limited(ops in arb_ops(), window_ms in 1u64..300) {
        let t0 = Instant::now();
        let window = Duration::from_millis(window_ms);
        let mut throttler: PersistenceThrottler<u8, u32> = PersistenceThrottler::new();
        let mut now = t0;
        let mut latest: Option<u32> = None;
        let mut runs: Vec<(Instant, u32)> = Vec::new();

        for (gap, op) in ops {
            now += Duration::from_millis(gap);
            match op {
                Op::Schedule(value) => {
                    throttler.schedule(0, Box::new(move || value), window, now);
                    latest = Some(value);
                }
                Op::Poll => {
                    for (_, value) in throttler.poll(now) {
                        prop_assert_eq!(Some(value), latest);
                        runs.push((now, value));
                    }
                }
            }
        }

        for pair in runs.windows(2) {
            prop_assert!(pair[1].0 - pair[0].0 >= window);
        }

        let pending = throttler.has_pending(&0);
        let flushed = throttler.flush(&0);
        prop_assert_eq!(flushed.is_some(), pending);
        if let Some(value) = flushed {
            prop_assert_eq!(Some(value), latest);
        }
        prop_assert!(!throttler.has_pending(&0));
    }

    #[test]
    fn interval_never_fires_early(period_ms in 1u64..200, gaps in prop::collection::vec(0u64..400, 1..40)) {
        let t0 = Instant::now();
        let period = Duration::from_millis(period_ms);
        let mut timers = Timers::new();
        let handle = timers.set_interval(period, t0);
        let mut now = t0;
        let mut fired = 0u64;
        for gap in gaps {
            now += Duration::from_millis(gap);
            let due = timers.fire_due(now);
            prop_assert!(due.len() <= 1);
            if !due.is_empty() {
                prop_assert_eq!(due[0], handle);
                fired += 1;
            }
        }
        let elapsed = (now - t0).as_millis() as u64;
        prop_assert!(fired <= elapsed / period_ms);
    }
}
