//! Flood suspension.
//!
//! A [`FloodFilter`] chains a [`FloodDetector`] (sliding window over raw
//! arrival times) with the [`ReducerState`] step function. Its output is an
//! order-preserving subsequence of its input: events are forwarded or
//! dropped, never delayed, duplicated or reordered.
//!
//! # Example
//!
//! ```
//! use floodgate::{FloodConfig, FloodFilter, RectifyMode, Timestamped};
//!
//! let mut filter = FloodFilter::new(FloodConfig::default(), RectifyMode::Plain).unwrap();
//! let secs = [2, 12, 23, 25, 27, 29, 31, 40, 50];
//! let forwarded: Vec<u32> = secs
//!     .iter()
//!     .zip(1..)
//!     .filter_map(|(s, id)| filter.offer(Timestamped::new(s * 1_000, id)).into_forwarded())
//!     .map(|e| e.value)
//!     .collect();
//! assert_eq!(forwarded, vec![1, 2, 3, 4, 9]);
//! ```

pub mod detector;
pub mod reducer;

pub use detector::{Detection, FloodDetector};
pub use reducer::{reduce, DropReason, ReduceRules, ReducerState, RectifyMode, Verdict};

use crate::config::FloodConfig;
use crate::error::ConfigError;
use crate::metrics::{names, MetricsCollector};
use crate::signal::Signal;
use crate::window::{Classification, Classified, TimestampMs, Timestamped, Window};
use std::fmt;
use tracing::{debug, info, trace};

/// Result of offering one event to a [`FloodFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer<T> {
    Forward {
        event: Timestamped<T>,
        /// Detection would have flagged it; forced through after a suspension.
        rectified: bool,
    },
    Drop {
        ts: TimestampMs,
        reason: DropReason,
    },
}

impl<T> Offer<T> {
    pub fn verdict(&self) -> Verdict {
        match self {
            Offer::Forward { rectified, .. } => Verdict::Forward { rectified: *rectified },
            Offer::Drop { reason, .. } => Verdict::Drop(*reason),
        }
    }

    pub fn into_forwarded(self) -> Option<Timestamped<T>> {
        match self {
            Offer::Forward { event, .. } => Some(event),
            Offer::Drop { .. } => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Offer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offer::Forward { event, rectified } => write!(
                f,
                "emitting {} @ {:.3}s{}",
                event.value,
                event.ts as f64 / 1000.0,
                if *rectified { " (rectified)" } else { "" }
            ),
            Offer::Drop { ts, .. } => write!(f, "in suspend, swallowing event @ {:.3}s", *ts as f64 / 1000.0),
        }
    }
}

/// Sliding-window flood detector plus suspension reducer for one stream.
pub struct FloodFilter<T> {
    config: FloodConfig,
    detector: FloodDetector,
    rules: ReduceRules,
    state: ReducerState,
    terminated: bool,
    metrics: Option<MetricsCollector>,
    _marker: std::marker::PhantomData<fn(T)>,
}

impl<T> FloodFilter<T> {
    /// Build a filter; fails if `config` does not validate.
    pub fn new(config: FloodConfig, mode: RectifyMode) -> Result<Self, ConfigError> {
        let config = config.checked()?;
        Ok(Self {
            detector: FloodDetector::new(&config),
            rules: ReduceRules {
                suspend_ms: config.suspend_ms,
                mode,
                rectify_len: config.warmup_len(),
            },
            config,
            state: ReducerState::default(),
            terminated: false,
            metrics: None,
            _marker: std::marker::PhantomData,
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &FloodConfig {
        &self.config
    }

    pub fn mode(&self) -> RectifyMode {
        self.rules.mode
    }

    /// Current reducer state.
    pub fn state(&self) -> ReducerState {
        self.state
    }

    /// Would an arrival at `ts` be swallowed by the current window?
    pub fn is_suspended_at(&self, ts: TimestampMs) -> bool {
        self.state.suppresses(ts, self.rules.suspend_ms)
    }

    /// The most recently opened suspension window, expired or not.
    pub fn suspension_window(&self) -> Option<Window> {
        self.state.window(self.rules.suspend_ms)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Classify one arrival and decide whether it passes.
    ///
    /// Arrivals are expected in non-decreasing timestamp order.
    pub fn offer(&mut self, event: Timestamped<T>) -> Offer<T> {
        let classification = match self.detector.observe(event.ts) {
            Detection::WarmUp => {
                trace!(ts = event.ts, "warm-up event forwarded");
                self.count(names::WARMUP_EVENTS);
                self.count(names::EVENTS_FORWARDED);
                return Offer::Forward { event, rectified: false };
            }
            Detection::Classified(c) => c,
        };

        let previous = self.state.suspend_window_start;
        let (next, verdict) = self.state.step(event.ts, classification, &self.rules);
        self.state = next;

        match verdict {
            Verdict::Forward { rectified } => {
                if rectified {
                    debug!(ts = event.ts, %classification, remaining = next.remaining_to_rectify, "event rectified");
                    self.count(names::EVENTS_RECTIFIED);
                } else {
                    debug!(ts = event.ts, "event forwarded");
                }
                self.count(names::EVENTS_FORWARDED);
                Offer::Forward { event, rectified }
            }
            Verdict::Drop(reason) => {
                if reason == DropReason::FloodDetected {
                    info!(
                        ts = event.ts,
                        suspend_ms = self.rules.suspend_ms,
                        previous = ?previous,
                        "flood detected, suspending"
                    );
                    self.count(names::SUSPENSIONS_STARTED);
                } else {
                    debug!(ts = event.ts, state = %self.state, "event swallowed");
                }
                self.count(names::EVENTS_DROPPED);
                Offer::Drop { ts: event.ts, reason }
            }
        }
    }

    /// Apply one source signal; returns what must go downstream, if anything.
    pub fn handle<E>(&mut self, signal: Signal<Timestamped<T>, E>) -> Option<Signal<T, E>> {
        if self.terminated {
            trace!("signal after terminal signal ignored");
            return None;
        }
        match signal {
            Signal::Next(event) => self
                .offer(event)
                .into_forwarded()
                .map(|e| Signal::Next(e.value)),
            Signal::Completed => {
                info!(state = %self.state, "source completed");
                self.terminate();
                Some(Signal::Completed)
            }
            Signal::Failed(err) => {
                info!(state = %self.state, "source failed");
                self.terminate();
                Some(Signal::Failed(err))
            }
        }
    }

    fn terminate(&mut self) {
        self.terminated = true;
        if let Some(metrics) = &self.metrics {
            metrics.record_finish();
        }
    }

    fn count(&self, name: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.increment_counter(name, 1);
        }
    }
}

impl<T> fmt::Debug for FloodFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloodFilter")
            .field("config", &self.config)
            .field("mode", &self.rules.mode)
            .field("state", &self.state)
            .field("terminated", &self.terminated)
            .finish()
    }
}

/// Replay pre-stamped arrivals through a fresh filter and collect the
/// forwarded values.
pub fn suspend_during_flood<T, I>(
    events: I,
    config: FloodConfig,
    mode: RectifyMode,
) -> Result<Vec<T>, ConfigError>
where
    I: IntoIterator<Item = Timestamped<T>>,
{
    let mut filter = FloodFilter::new(config, mode)?;
    Ok(events
        .into_iter()
        .filter_map(|e| filter.offer(e).into_forwarded())
        .map(|e| e.value)
        .collect())
}

/// Classification the detector alone gives each arrival, ignoring any
/// suspension. Warm-up arrivals are reported as values.
pub fn classify_arrivals<T, I>(events: I, config: &FloodConfig) -> Vec<Classified<T>>
where
    I: IntoIterator<Item = Timestamped<T>>,
{
    let mut detector = FloodDetector::new(config);
    events
        .into_iter()
        .map(|e| match detector.observe(e.ts) {
            Detection::WarmUp => e.classify(Classification::Value),
            Detection::Classified(c) => e.classify(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(secs: &[i64]) -> Vec<Timestamped<u32>> {
        secs.iter()
            .zip(1..)
            .map(|(s, id)| Timestamped::new(s * 1_000, id))
            .collect()
    }

    const BASIC: [i64; 9] = [2, 12, 23, 25, 27, 29, 31, 40, 50];
    const OVERLAP: [i64; 9] = [0, 1, 2, 15, 16, 17, 20, 31, 40];

    #[test]
    fn basic_flood_both_modes() {
        for mode in [RectifyMode::Plain, RectifyMode::Rectifying] {
            let out = suspend_during_flood(stamped(&BASIC), FloodConfig::default(), mode).unwrap();
            assert_eq!(out, vec![1, 2, 3, 4, 9], "{mode:?}");
        }
    }

    #[test]
    fn overlapping_floods_stitch_in_plain_mode() {
        let out = suspend_during_flood(stamped(&OVERLAP), FloodConfig::default(), RectifyMode::Plain).unwrap();
        assert_eq!(out, vec![1, 2, 9]);
    }

    #[test]
    fn rectifying_mode_releases_events_after_window() {
        let out =
            suspend_during_flood(stamped(&OVERLAP), FloodConfig::default(), RectifyMode::Rectifying).unwrap();
        assert_eq!(out, vec![1, 2, 6, 7, 8, 9]);
    }

    #[test]
    fn verdicts_and_inspection() {
        let mut filter = FloodFilter::new(FloodConfig::default(), RectifyMode::Plain).unwrap();
        let verdicts: Vec<_> = stamped(&BASIC)
            .into_iter()
            .take(6)
            .map(|e| filter.offer(e).verdict())
            .collect();
        assert_eq!(verdicts[4], Verdict::Drop(DropReason::FloodDetected));
        assert_eq!(verdicts[5], Verdict::Drop(DropReason::Suspended));
        assert_eq!(filter.suspension_window(), Some(Window::new(27_000, 42_000)));
        assert!(filter.is_suspended_at(41_999));
        assert!(!filter.is_suspended_at(42_000));
    }

    #[test]
    fn metrics_track_decisions() {
        let metrics = MetricsCollector::new();
        let mut filter = FloodFilter::new(FloodConfig::default(), RectifyMode::Rectifying)
            .unwrap()
            .with_metrics(metrics.clone());
        for e in stamped(&OVERLAP) {
            filter.offer(e);
        }
        assert_eq!(metrics.counter(names::WARMUP_EVENTS), 2);
        assert_eq!(metrics.counter(names::EVENTS_FORWARDED), 6);
        assert_eq!(metrics.counter(names::EVENTS_DROPPED), 3);
        assert_eq!(metrics.counter(names::SUSPENSIONS_STARTED), 1);
        assert_eq!(metrics.counter(names::EVENTS_RECTIFIED), 2);
    }

    #[test]
    fn terminal_signal_is_forwarded_once() {
        let mut filter = FloodFilter::<u32>::new(FloodConfig::default(), RectifyMode::Plain).unwrap();
        assert_eq!(filter.handle::<()>(Signal::Next(Timestamped::new(0, 1))), Some(Signal::Next(1)));
        assert_eq!(filter.handle::<()>(Signal::Completed), Some(Signal::Completed));
        assert!(filter.is_terminated());
        assert_eq!(filter.handle::<()>(Signal::Next(Timestamped::new(1, 2))), None);
        assert_eq!(filter.handle::<()>(Signal::Failed(())), None);
    }

    #[test]
    fn detector_sees_raw_history() {
        let classes: Vec<_> = classify_arrivals(stamped(&BASIC), &FloodConfig::default())
            .into_iter()
            .map(|c| c.classification)
            .collect();
        use Classification::{Suspend, Value};
        assert_eq!(classes, vec![Value, Value, Value, Value, Suspend, Suspend, Suspend, Value, Value]);
    }

    #[test]
    fn offer_display() {
        let mut filter = FloodFilter::new(FloodConfig::default(), RectifyMode::Plain).unwrap();
        assert_eq!(filter.offer(Timestamped::new(2_000, 1)).to_string(), "emitting 1 @ 2.000s");
        filter.offer(Timestamped::new(2_100, 2));
        assert_eq!(
            filter.offer(Timestamped::new(2_200, 3)).to_string(),
            "in suspend, swallowing event @ 2.200s"
        );
    }
}
