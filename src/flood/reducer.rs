//! Sequential suspension reducer.
//!
//! [`ReducerState::step`] is a pure function of the previous state and one
//! classified arrival. It never looks at values, only at timestamps and
//! classifications, so the same state machine serves every `T`.
//!
//! Step order:
//!
//! 1. an active window whose end is still ahead of `ts` swallows the event,
//!    state untouched;
//! 2. (rectifying only) an armed counter forwards the event as a value and
//!    counts down;
//! 3. a `Suspend` classification opens a new window at `ts` and swallows the
//!    triggering event;
//! 4. anything else is forwarded and the state is reset.
//!
//! Because step 1 runs before any classification is consulted, a second
//! flood detected right as a window expires reopens the window at once, and
//! back-to-back floods read as one continuous drop period.

use crate::window::{Classification, TimestampMs, Window};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether post-suspension arrivals get their classification corrected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectifyMode {
    #[default]
    Plain,
    /// After each suspension, force the next `max_elements_per_window - 1`
    /// arrivals through as values, since their detection window still
    /// contains swallowed events.
    Rectifying,
}

/// Why an event was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Arrived inside an active suspension window.
    Suspended,
    /// Completed a flood window and opened a new suspension.
    FloodDetected,
}

/// Decision for a single arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Forward { rectified: bool },
    Drop(DropReason),
}

impl Verdict {
    #[inline]
    pub fn is_forward(&self) -> bool {
        matches!(self, Verdict::Forward { .. })
    }
}

/// Parameters that stay fixed for the lifetime of a reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceRules {
    pub suspend_ms: u64,
    pub mode: RectifyMode,
    /// Counter value armed when a suspension starts in rectifying mode.
    pub rectify_len: usize,
}

/// State carried from one reduction step to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducerState {
    /// Start of the current suspension window, if one was opened.
    pub suspend_window_start: Option<TimestampMs>,
    /// Arrivals still to be forced through as values.
    pub remaining_to_rectify: usize,
}

impl ReducerState {
    /// The suspension window as `[start, start + suspend_ms)`.
    pub fn window(&self, suspend_ms: u64) -> Option<Window> {
        self.suspend_window_start
            .map(|start| Window::starting_at(start, suspend_ms))
    }

    /// True if an arrival at `ts` would be swallowed by step 1.
    pub fn suppresses(&self, ts: TimestampMs, suspend_ms: u64) -> bool {
        self.window(suspend_ms).is_some_and(|w| ts < w.end)
    }

    /// Apply one arrival.
    #[must_use]
    pub fn step(
        self,
        ts: TimestampMs,
        classification: Classification,
        rules: &ReduceRules,
    ) -> (Self, Verdict) {
        if self.suppresses(ts, rules.suspend_ms) {
            return (self, Verdict::Drop(DropReason::Suspended));
        }

        if rules.mode == RectifyMode::Rectifying && self.remaining_to_rectify > 0 {
            let next = Self {
                suspend_window_start: self.suspend_window_start,
                remaining_to_rectify: self.remaining_to_rectify - 1,
            };
            return (next, Verdict::Forward { rectified: true });
        }

        match classification {
            Classification::Suspend => {
                let remaining_to_rectify = match rules.mode {
                    RectifyMode::Plain => 0,
                    RectifyMode::Rectifying => rules.rectify_len,
                };
                let next = Self {
                    suspend_window_start: Some(ts),
                    remaining_to_rectify,
                };
                (next, Verdict::Drop(DropReason::FloodDetected))
            }
            Classification::Value => (Self::default(), Verdict::Forward { rectified: false }),
        }
    }
}

/// Fold a whole sequence of classified arrivals from the initial state.
///
/// Returns the final state and one verdict per arrival, in order.
pub fn reduce<I>(steps: I, rules: &ReduceRules) -> (ReducerState, Vec<Verdict>)
where
    I: IntoIterator<Item = (TimestampMs, Classification)>,
{
    let mut state = ReducerState::default();
    let verdicts = steps
        .into_iter()
        .map(|(ts, classification)| {
            let (next, verdict) = state.step(ts, classification, rules);
            state = next;
            verdict
        })
        .collect();
    (state, verdicts)
}

impl fmt::Display for ReducerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suspend_window_start {
            Some(start) => write!(
                f,
                "in suspend since {:.3}s, swallowing ({} to rectify)",
                start as f64 / 1000.0,
                self.remaining_to_rectify
            ),
            None => f.write_str("emitting"),
        }
    }
}
