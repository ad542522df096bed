//! Tick sources for the timeout trigger.

use crate::clock::{duration_to_ms, Clock};
use crate::error::SendError;
use crate::window::TimestampMs;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Something that periodically wakes the batcher.
#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next tick. Returns `false` once the source is exhausted;
    /// the driver stops polling it after that.
    async fn tick(&mut self) -> bool;
}

/// Fixed-rate ticker; the first tick lands one full period after creation.
///
/// The cadence is never reset by flushes. Must be created inside a tokio
/// runtime.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticker fed by hand through a [`TickHandle`].
#[derive(Debug)]
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Fires ticks on the paired [`ManualTicker`]. Dropping every handle
/// exhausts the ticker.
#[derive(Debug, Clone)]
pub struct TickHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTicker {
    pub fn new() -> (Self, TickHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, TickHandle { tx })
    }
}

impl TickHandle {
    pub fn tick(&self) -> Result<(), SendError> {
        self.tx.send(()).map_err(|_| SendError)
    }
}

#[async_trait]
impl TickSource for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// Never ticks; disables the timeout trigger.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverTicker;

#[async_trait]
impl TickSource for NeverTicker {
    async fn tick(&mut self) -> bool {
        std::future::pending::<()>().await;
        false
    }
}

/// [`Clock`] reading tokio's time, which follows `tokio::time::pause` and
/// `advance` in tests.
#[derive(Debug, Clone)]
pub struct TokioClock {
    start: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> TimestampMs {
        duration_to_ms(self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_after_one_period() {
        let clock = TokioClock::new();
        let mut ticker = IntervalTicker::new(Duration::from_millis(500));
        assert!(ticker.tick().await);
        assert_eq!(clock.now_ms(), 500);
        assert!(ticker.tick().await);
        assert_eq!(clock.now_ms(), 1_000);
    }

    #[tokio::test]
    async fn manual_ticker_exhausts_when_handles_drop() {
        let (mut ticker, handle) = ManualTicker::new();
        handle.tick().unwrap();
        assert!(ticker.tick().await);
        drop(handle);
        assert!(!ticker.tick().await);
    }
}
