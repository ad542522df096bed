use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Milliseconds on the owning component's clock.
pub type TimestampMs = i64;

/// A closed-open time range: [start, end).
///
/// Used for suspension windows: an event at `ts` is suppressed while
/// `start <= ts < end`.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Eq)]
pub struct Window {
    pub start: TimestampMs,
    pub end: TimestampMs,
}

impl Window {
    #[inline]
    pub fn new(start: TimestampMs, end: TimestampMs) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    /// The window `[start, start + len_ms)`, saturating at `i64::MAX`.
    #[inline]
    pub fn starting_at(start: TimestampMs, len_ms: u64) -> Self {
        let len = i64::try_from(len_ms).unwrap_or(i64::MAX);
        Self { start, end: start.saturating_add(len) }
    }

    #[inline]
    pub fn contains(&self, ts: TimestampMs) -> bool {
        ts >= self.start && ts < self.end
    }

    #[inline]
    pub fn len_ms(&self) -> i64 {
        self.end - self.start
    }
}

// Ordered by start, then end.
impl PartialEq for Window {
    #[inline] fn eq(&self, other: &Self) -> bool { self.start == other.start && self.end == other.end }
}
impl Hash for Window {
    #[inline] fn hash<H: Hasher>(&self, state: &mut H) { self.start.hash(state); self.end.hash(state); }
}
impl Ord for Window {
    #[inline] fn cmp(&self, o: &Self) -> std::cmp::Ordering {
        self.start.cmp(&o.start).then(self.end.cmp(&o.end))
    }
}
impl PartialOrd for Window {
    #[inline] fn partial_cmp(&self, o: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(o)) }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}ms, {}ms)", self.start, self.end)
    }
}

/// A value stamped with its arrival time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timestamped<T> {
    pub ts: TimestampMs,
    pub value: T,
}

impl<T> Timestamped<T> {
    #[inline] pub fn new(ts: TimestampMs, value: T) -> Self { Self { ts, value } }

    #[inline]
    pub fn classify(self, classification: Classification) -> Classified<T> {
        Classified { ts: self.ts, value: self.value, classification }
    }
}

/// Outcome of the sliding-window check for a single event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Ordinary event.
    Value,
    /// The event completes a full window whose span fits in the window duration.
    Suspend,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Value => f.write_str("Value"),
            Classification::Suspend => f.write_str("Suspend"),
        }
    }
}

/// A timestamped value together with its window classification.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classified<T> {
    pub ts: TimestampMs,
    pub value: T,
    pub classification: Classification,
}

impl<T> Classified<T> {
    /// Same event, classification forced to [`Classification::Value`].
    #[inline]
    pub fn rectified(self) -> Self {
        Self { classification: Classification::Value, ..self }
    }
}

impl<T: fmt::Display> fmt::Display for Classified<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) @ {:.3}s", self.value, self.classification, self.ts as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_closed_open() {
        let w = Window::starting_at(2_000, 15_000);
        assert_eq!(w, Window::new(2_000, 17_000));
        assert!(w.contains(2_000));
        assert!(w.contains(16_999));
        assert!(!w.contains(17_000));
        assert!(!w.contains(1_999));
        assert_eq!(w.len_ms(), 15_000);
    }

    #[test]
    fn starting_at_saturates() {
        let w = Window::starting_at(i64::MAX - 5, u64::MAX);
        assert_eq!(w.end, i64::MAX);
    }

    #[test]
    fn classified_display_matches_trace_format() {
        let c = Timestamped::new(27_000, 5).classify(Classification::Suspend);
        assert_eq!(c.to_string(), "(5, Suspend) @ 27.000s");
        assert_eq!(c.rectified().classification, Classification::Value);
    }
}
