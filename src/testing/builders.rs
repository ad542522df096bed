//! Arrival script builders.
//!
//! Scenarios are easiest to read as gaps between arrivals ("2s, then 10s,
//! then 11s..."). [`ArrivalScriptBuilder`] turns gaps into absolute
//! timestamps for the synchronous filter, and keeps the gaps themselves for
//! replaying against tokio's paused clock.

use crate::clock::duration_to_ms;
use crate::window::{TimestampMs, Timestamped};
use std::time::Duration;

/// A fluent builder for timed arrivals.
///
/// # Example
///
/// ```
/// use floodgate::testing::ArrivalScriptBuilder;
/// use std::time::Duration;
///
/// let arrivals = ArrivalScriptBuilder::new()
///     .after_secs(2, "a")
///     .burst(3, Duration::from_millis(100), ["b", "c", "d"])
///     .build();
///
/// let ts: Vec<_> = arrivals.iter().map(|a| a.ts).collect();
/// assert_eq!(ts, vec![2_000, 2_100, 2_200, 2_300]);
/// ```
#[derive(Debug, Clone)]
pub struct ArrivalScriptBuilder<T> {
    start: TimestampMs,
    steps: Vec<(Duration, T)>,
}

impl<T> Default for ArrivalScriptBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ArrivalScriptBuilder<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start: 0,
            steps: Vec::new(),
        }
    }

    /// Offset every timestamp produced by [`build`](Self::build).
    #[must_use]
    pub fn starting_at(mut self, start: TimestampMs) -> Self {
        self.start = start;
        self
    }

    /// `value` arrives `gap` after the previous arrival.
    #[must_use]
    pub fn after(mut self, gap: Duration, value: T) -> Self {
        self.steps.push((gap, value));
        self
    }

    #[must_use]
    pub fn after_ms(self, gap_ms: u64, value: T) -> Self {
        self.after(Duration::from_millis(gap_ms), value)
    }

    #[must_use]
    pub fn after_secs(self, gap_secs: u64, value: T) -> Self {
        self.after(Duration::from_secs(gap_secs), value)
    }

    /// Up to `count` values from `values`, each `spacing` after the previous.
    #[must_use]
    pub fn burst(mut self, count: usize, spacing: Duration, values: impl IntoIterator<Item = T>) -> Self {
        self.steps
            .extend(values.into_iter().take(count).map(|v| (spacing, v)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The script as `(gap, value)` steps.
    #[must_use]
    pub fn build_steps(self) -> Vec<(Duration, T)> {
        self.steps
    }

    /// The script as absolute arrivals.
    #[must_use]
    pub fn build(self) -> Vec<Timestamped<T>> {
        let mut now = self.start;
        self.steps
            .into_iter()
            .map(|(gap, value)| {
                now = now.saturating_add(duration_to_ms(gap));
                Timestamped::new(now, value)
            })
            .collect()
    }
}

impl ArrivalScriptBuilder<u32> {
    /// Arrivals numbered `1..` separated by whole-second gaps.
    ///
    /// ```
    /// use floodgate::testing::ArrivalScriptBuilder;
    ///
    /// let ts: Vec<_> = ArrivalScriptBuilder::numbered_secs(&[2, 10, 11])
    ///     .build()
    ///     .into_iter()
    ///     .map(|a| (a.value, a.ts))
    ///     .collect();
    /// assert_eq!(ts, vec![(1, 2_000), (2, 12_000), (3, 23_000)]);
    /// ```
    #[must_use]
    pub fn numbered_secs(gaps_secs: &[u64]) -> Self {
        gaps_secs
            .iter()
            .zip(1..)
            .fold(Self::new(), |b, (&gap, id)| b.after_secs(gap, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_offset_applies_to_every_arrival() {
        let arrivals = ArrivalScriptBuilder::new()
            .starting_at(1_000)
            .after_ms(0, 'a')
            .after_ms(250, 'b')
            .build();
        assert_eq!(arrivals, vec![Timestamped::new(1_000, 'a'), Timestamped::new(1_250, 'b')]);
    }

    #[test]
    fn burst_takes_at_most_count_values() {
        let b = ArrivalScriptBuilder::new().burst(2, Duration::from_secs(1), 0..10);
        assert_eq!(b.len(), 2);
        let steps = b.build_steps();
        assert_eq!(steps, vec![(Duration::from_secs(1), 0), (Duration::from_secs(1), 1)]);
    }
}
