//! Stream notifications.
//!
//! A stream delivers any number of [`Signal::Next`] items followed by at most
//! one terminal signal. Components forward the terminal signal exactly once
//! and ignore everything after it.

use serde::{Deserialize, Serialize};

#[cfg(feature = "runtime")]
pub use crate::runtime::channel::{channel, SignalReceiver, SignalSender};

/// One notification from a stream of `T` that may fail with `E`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "payload")]
pub enum Signal<T, E> {
    Next(T),
    Completed,
    Failed(E),
}

impl<T, E> Signal<T, E> {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }

    #[inline]
    pub fn into_next(self) -> Option<T> {
        match self {
            Signal::Next(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Signal<U, E> {
        match self {
            Signal::Next(v) => Signal::Next(f(v)),
            Signal::Completed => Signal::Completed,
            Signal::Failed(e) => Signal::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_detection_and_map() {
        let next: Signal<i32, String> = Signal::Next(2);
        assert!(!next.is_terminal());
        assert_eq!(next.map(|v| v * 10).into_next(), Some(20));

        let failed: Signal<i32, String> = Signal::Failed("boom".into());
        assert!(failed.is_terminal());
        assert_eq!(failed.map(|v| v + 1), Signal::Failed("boom".to_string()));
        assert!(Signal::<i32, ()>::Completed.is_terminal());
    }
}
