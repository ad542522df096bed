//! Sliding-window flood detection over raw arrival times.

use crate::config::FloodConfig;
use crate::window::{Classification, TimestampMs};
use std::collections::VecDeque;

/// Result of feeding one arrival into a [`FloodDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// The ring is not full yet; the event bypasses classification.
    WarmUp,
    Classified(Classification),
}

/// Ring of the last `max_elements_per_window` raw arrival times.
///
/// Every arrival is recorded, whether or not the reducer later forwards it.
#[derive(Debug, Clone)]
pub struct FloodDetector {
    ring: VecDeque<TimestampMs>,
    capacity: usize,
    window_ms: i64,
}

impl FloodDetector {
    pub fn new(config: &FloodConfig) -> Self {
        let capacity = config.max_elements_per_window;
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
            window_ms: i64::try_from(config.window_ms).unwrap_or(i64::MAX),
        }
    }

    /// Record `ts` and classify it against the oldest arrival in the ring.
    pub fn observe(&mut self, ts: TimestampMs) -> Detection {
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(ts);
        if self.ring.len() < self.capacity {
            return Detection::WarmUp;
        }

        match self.span() {
            Some(span) if span <= self.window_ms => Detection::Classified(Classification::Suspend),
            _ => Detection::Classified(Classification::Value),
        }
    }

    /// Distance between newest and oldest recorded arrivals.
    pub fn span(&self) -> Option<i64> {
        let oldest = self.ring.front()?;
        let newest = self.ring.back()?;
        Some(newest.saturating_sub(*oldest))
    }

    pub fn is_warm(&self) -> bool {
        self.ring.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(n: usize, window_ms: u64) -> FloodDetector {
        FloodDetector::new(&FloodConfig {
            max_elements_per_window: n,
            window_ms,
            suspend_ms: 15_000,
        })
    }

    #[test]
    fn first_n_minus_one_arrivals_warm_up() {
        let mut d = detector(3, 5_000);
        assert_eq!(d.observe(0), Detection::WarmUp);
        assert_eq!(d.observe(1), Detection::WarmUp);
        assert!(!d.is_warm());
        assert_eq!(d.observe(2), Detection::Classified(Classification::Suspend));
        assert!(d.is_warm());
    }

    #[test]
    fn span_boundary_is_inclusive() {
        let mut d = detector(2, 5_000);
        d.observe(0);
        assert_eq!(d.observe(5_000), Detection::Classified(Classification::Suspend));
        assert_eq!(d.observe(10_001), Detection::Classified(Classification::Value));
    }

    #[test]
    fn ring_slides_by_one() {
        let mut d = detector(3, 5_000);
        for ts in [2_000, 12_000, 23_000, 25_000] {
            d.observe(ts);
        }
        assert_eq!(d.len(), 3);
        assert_eq!(d.span(), Some(13_000));
        assert_eq!(d.observe(27_000), Detection::Classified(Classification::Suspend));
        assert_eq!(d.span(), Some(4_000));
    }
}
