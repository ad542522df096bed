//! Clock abstraction used to stamp arrivals.
//!
//! Components never read ambient time; the clock is handed to them at
//! construction so tests can drive time explicitly.

use crate::window::TimestampMs;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic timestamps in milliseconds.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp. Successive calls never go backwards.
    fn now_ms(&self) -> TimestampMs;
}

/// System clock backed by `Instant`, counting from construction.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self { start: Instant::now() }
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> TimestampMs {
        duration_to_ms(self.start.elapsed())
    }
}

/// Hand-driven clock for deterministic replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ts: TimestampMs) -> Self {
        Self { now: AtomicI64::new(ts) }
    }

    /// Move the clock forward by `by`; returns the new reading.
    pub fn advance(&self, by: Duration) -> TimestampMs {
        let delta = duration_to_ms(by);
        self.now.fetch_add(delta, Ordering::SeqCst) + delta
    }

    /// Jump to `ts`. Moving backwards is ignored.
    pub fn set(&self, ts: TimestampMs) {
        self.now.fetch_max(ts, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}

pub(crate) fn duration_to_ms(d: Duration) -> TimestampMs {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_and_never_rewinds() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.advance(Duration::from_secs(2)), 2_000);
        clock.set(1_000);
        assert_eq!(clock.now_ms(), 2_000);
        clock.set(12_000);
        assert_eq!(clock.now_ms(), 12_000);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
        assert!(a >= 0);
    }
}
