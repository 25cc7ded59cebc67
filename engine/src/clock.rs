//! Clock-derived task identifiers.
//!
//! Ids are the decimal epoch-millisecond time of creation. The clock never
//! hands out the same value twice: if asked again within the same millisecond,
//! or after the wall clock stepped backwards, it issues `last + 1` instead.

use crate::{TaskId, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest value the clock adopts from outside. Anything above it cannot be
/// a millisecond timestamp and would leave no room to keep counting.
pub const MAX_OBSERVED: Timestamp = u64::MAX / 2;

/// A monotonic id source.
///
/// The clock has no notion of wall time itself; callers pass `now_ms`.
#[derive(Debug, Default)]
pub struct IdClock {
    last: AtomicU64,
}

impl IdClock {
    /// Create a clock that has issued nothing yet.
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Create a clock that will only issue values above `last`.
    ///
    /// `last` is capped at [`MAX_OBSERVED`].
    pub fn starting_after(last: Timestamp) -> Self {
        Self {
            last: AtomicU64::new(last.min(MAX_OBSERVED)),
        }
    }

    /// The last value issued (0 if none).
    pub fn last(&self) -> Timestamp {
        self.last.load(Ordering::SeqCst)
    }

    /// Issue the next raw value for the given wall time.
    pub fn tick(&self, now_ms: Timestamp) -> Timestamp {
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let next = now_ms.max(current.saturating_add(1));
            match self
                .last
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Issue the next task id for the given wall time.
    pub fn next_id(&self, now_ms: Timestamp) -> TaskId {
        self.tick(now_ms).to_string()
    }

    /// Make sure future ids sort after an id seen elsewhere.
    ///
    /// Non-numeric ids and values above [`MAX_OBSERVED`] are ignored.
    pub fn observe(&self, id: &str) {
        match id.parse::<u64>() {
            Ok(value) if value <= MAX_OBSERVED => {
                self.last.fetch_max(value, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn new_clock_starts_at_zero() {
        let clock = IdClock::new();
        assert_eq!(clock.last(), 0);
    }

    #[test]
    fn uses_wall_time_when_it_advances() {
        let clock = IdClock::new();
        assert_eq!(clock.next_id(1_706_745_600_000), "1706745600000");
        assert_eq!(clock.next_id(1_706_745_600_500), "1706745600500");
    }

    #[test]
    fn same_millisecond_bumps() {
        let clock = IdClock::new();
        assert_eq!(clock.tick(1000), 1000);
        assert_eq!(clock.tick(1000), 1001);
        assert_eq!(clock.tick(1000), 1002);
    }

    #[test]
    fn backwards_wall_clock_keeps_increasing() {
        let clock = IdClock::starting_after(5000);
        assert_eq!(clock.tick(1000), 5001);
    }

    #[test]
    fn observe_moves_past_foreign_ids() {
        let clock = IdClock::new();
        clock.observe("9000");
        clock.observe("not-a-number");
        assert_eq!(clock.tick(100), 9001);

        clock.observe("10");
        assert_eq!(clock.last(), 9001);
    }

    #[test]
    fn huge_foreign_ids_are_ignored() {
        let clock = IdClock::new();
        clock.observe("18446744073709551615");
        clock.observe(&(MAX_OBSERVED + 1).to_string());
        assert_eq!(clock.last(), 0);
        assert_eq!(clock.tick(1000), 1000);

        clock.observe(&MAX_OBSERVED.to_string());
        assert_eq!(clock.tick(1000), MAX_OBSERVED + 1);
        assert_eq!(clock.tick(1000), MAX_OBSERVED + 2);
    }

    #[test]
    fn starting_after_is_capped() {
        let clock = IdClock::starting_after(u64::MAX);
        assert_eq!(clock.last(), MAX_OBSERVED);
        assert!(clock.tick(0) > MAX_OBSERVED);
    }

    #[test]
    fn concurrent_ticks_are_unique() {
        let clock = Arc::new(IdClock::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || (0..250).map(|_| clock.tick(1)).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate id {}", value);
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
