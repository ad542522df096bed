//! Multi-trigger batching buffer.
//!
//! [`BatchBuffer`] accumulates events and hands them downstream as a
//! [`Batch`] when one of three independent triggers fires:
//!
//! - **count**: the pending batch reached `count_threshold` events,
//! - **timeout**: the periodic timer ticked,
//! - **manual**: an external flush request arrived.
//!
//! Source completion flushes whatever is left; a source failure discards it.
//! The buffer itself owns no timer: whoever drives it (see
//! [`spawn_batcher`](crate::runtime::spawn_batcher)) calls
//! [`on_tick`](BatchBuffer::on_tick) and [`on_manual`](BatchBuffer::on_manual)
//! from the same task that delivers events, so all mutation happens on one
//! path.
//!
//! # Example
//!
//! ```
//! use floodgate::{BatchBuffer, BatchConfig, FlushTrigger};
//!
//! let mut buffer = BatchBuffer::new(BatchConfig::default()).unwrap();
//! let mut out = Vec::new();
//! for i in 0..10 {
//!     out.extend(buffer.push(i));
//! }
//! assert_eq!(out[0].items, vec![0, 1, 2, 3, 4, 5]);
//! assert_eq!(buffer.len(), 4);
//!
//! let tail = buffer.on_tick().unwrap();
//! assert_eq!(tail.trigger, FlushTrigger::Timeout);
//! assert_eq!(tail.items, vec![6, 7, 8, 9]);
//! assert!(buffer.on_manual().is_none());
//! ```

use crate::config::BatchConfig;
use crate::error::ConfigError;
use crate::metrics::{names, MetricsCollector};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use tracing::{debug, info, trace, warn};

/// What caused a batch to be flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushTrigger {
    Count,
    Timeout,
    Manual,
    Completion,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlushTrigger::Count => "count",
            FlushTrigger::Timeout => "timeout",
            FlushTrigger::Manual => "manual",
            FlushTrigger::Completion => "completion",
        };
        f.write_str(s)
    }
}

/// A non-empty, ordered group of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub trigger: FlushTrigger,
    /// Zero-based position of this batch in the buffer's output.
    pub sequence: u64,
}

impl<T> Batch<T> {
    #[inline]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for Batch<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

/// Count/timeout/manual batching state machine.
pub struct BatchBuffer<T> {
    config: BatchConfig,
    pending: Vec<T>,
    emitted: u64,
    terminated: bool,
    metrics: Option<MetricsCollector>,
}

impl<T> BatchBuffer<T> {
    /// Build a buffer; fails if `config` does not validate.
    pub fn new(config: BatchConfig) -> Result<Self, ConfigError> {
        let config = config.checked()?;
        Ok(Self {
            pending: Vec::with_capacity(config.count_threshold),
            config,
            emitted: 0,
            terminated: false,
            metrics: None,
        })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Number of events waiting for the next flush.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// True once completion or failure has been observed.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Append an event; returns the batch if this reached the count threshold.
    pub fn push(&mut self, value: T) -> Option<Batch<T>> {
        if self.terminated {
            trace!("event after terminal signal ignored");
            return None;
        }
        self.pending.push(value);
        debug!(
            pending = self.pending.len(),
            threshold = self.config.count_threshold,
            "event buffered"
        );
        if self.pending.len() < self.config.count_threshold {
            self.gauge_pending();
            return None;
        }
        self.flush(FlushTrigger::Count)
    }

    /// Periodic timer tick.
    pub fn on_tick(&mut self) -> Option<Batch<T>> {
        if !self.terminated {
            warn!(pending = self.pending.len(), "flush timer fired");
        }
        self.flush(FlushTrigger::Timeout)
    }

    /// External flush request.
    pub fn on_manual(&mut self) -> Option<Batch<T>> {
        if !self.terminated {
            warn!(pending = self.pending.len(), "manual flush requested");
        }
        self.flush(FlushTrigger::Manual)
    }

    /// Emit the pending events, if any, and start a new batch.
    ///
    /// An empty buffer produces nothing; the attempt is only logged and
    /// counted under [`names::EMPTY_FLUSHES`].
    pub fn flush(&mut self, trigger: FlushTrigger) -> Option<Batch<T>> {
        if self.terminated {
            trace!(%trigger, "flush after terminal signal ignored");
            return None;
        }
        if self.pending.is_empty() {
            debug!(%trigger, "empty buffer flush skipped");
            self.count(names::EMPTY_FLUSHES, 1);
            return None;
        }

        let items = std::mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.config.count_threshold),
        );
        let batch = Batch {
            trigger,
            sequence: self.emitted,
            items,
        };
        self.emitted += 1;

        info!(%trigger, size = batch.items.len(), sequence = batch.sequence, "batch flushed");
        if let Some(metrics) = &self.metrics {
            metrics.increment_counter(names::BATCHES_EMITTED, 1);
            metrics.increment_counter(names::EVENTS_BATCHED, batch.items.len() as u64);
            metrics.observe(names::BATCH_SIZE, batch.items.len() as f64);
        }
        self.gauge_pending();
        Some(batch)
    }

    /// Source completed: flush the remainder and stop accepting input.
    pub fn complete(&mut self) -> Option<Batch<T>> {
        if self.terminated {
            return None;
        }
        info!(pending = self.pending.len(), "source completed");
        let last = self.flush(FlushTrigger::Completion);
        self.terminate();
        last
    }

    /// Source failed: discard the pending events and stop accepting input.
    ///
    /// Returns how many buffered events were discarded.
    pub fn fail(&mut self) -> usize {
        if self.terminated {
            return 0;
        }
        let discarded = self.pending.len();
        self.pending.clear();
        warn!(discarded, "source failed, pending events discarded");
        self.count(names::EVENTS_DISCARDED, discarded as u64);
        self.gauge_pending();
        self.terminate();
        discarded
    }

    /// Apply one source signal and return what must go downstream, in order.
    ///
    /// A terminal signal is forwarded exactly once; anything arriving after
    /// it yields nothing.
    pub fn handle<E>(&mut self, signal: Signal<T, E>) -> Vec<Signal<Batch<T>, E>> {
        if self.terminated {
            trace!("signal after terminal signal ignored");
            return Vec::new();
        }
        match signal {
            Signal::Next(value) => self.push(value).map(Signal::Next).into_iter().collect(),
            Signal::Completed => {
                let mut out: Vec<_> = self.complete().map(Signal::Next).into_iter().collect();
                out.push(Signal::Completed);
                out
            }
            Signal::Failed(err) => {
                self.fail();
                vec![Signal::Failed(err)]
            }
        }
    }

    fn terminate(&mut self) {
        self.terminated = true;
        if let Some(metrics) = &self.metrics {
            metrics.record_finish();
        }
    }

    fn count(&self, name: &str, by: u64) {
        if let Some(metrics) = &self.metrics {
            metrics.increment_counter(name, by);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn gauge_pending(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_gauge(names::PENDING_EVENTS, self.pending.len() as f64);
        }
    }
}

impl<T> fmt::Debug for BatchBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchBuffer")
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .field("emitted", &self.emitted)
            .field("terminated", &self.terminated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn buffer(threshold: usize) -> BatchBuffer<u32> {
        BatchBuffer::new(BatchConfig {
            count_threshold: threshold,
            timeout_ms: 500,
        })
        .unwrap()
    }

    #[test]
    fn count_flush_fires_on_threshold() {
        let mut b = buffer(6);
        let batches: Vec<_> = (0..10).filter_map(|i| b.push(i)).collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].items, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(batches[0].trigger, FlushTrigger::Count);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn threshold_of_one_flushes_every_event() {
        let mut b = buffer(1);
        assert_eq!(b.push(7).map(Batch::into_items), Some(vec![7]));
        assert_eq!(b.push(8).map(|b| b.sequence), Some(1));
        assert!(b.is_empty());
    }

    #[test]
    fn empty_flushes_are_no_ops() {
        let metrics = MetricsCollector::new();
        let mut b = buffer(6).with_metrics(metrics.clone());
        assert!(b.on_tick().is_none());
        assert!(b.on_manual().is_none());
        assert_eq!(metrics.counter(names::EMPTY_FLUSHES), 2);
        assert_eq!(metrics.counter(names::BATCHES_EMITTED), 0);
    }

    #[test]
    fn back_to_back_triggers_see_the_cleared_batch() {
        let mut b = buffer(6);
        b.push(1);
        assert_eq!(b.on_tick().map(Batch::into_items), Some(vec![1]));
        assert!(b.on_manual().is_none());
        b.push(2);
        assert_eq!(b.on_manual().map(Batch::into_items), Some(vec![2]));
    }

    #[test]
    fn completion_flushes_remainder_once() {
        let mut b = buffer(6);
        b.push(12);
        let last = b.complete().unwrap();
        assert_eq!(last.items, vec![12]);
        assert_eq!(last.trigger, FlushTrigger::Completion);
        assert!(b.is_terminated());
        assert!(b.complete().is_none());
        assert!(b.push(13).is_none());
        assert!(b.on_tick().is_none());
    }

    #[test]
    fn completion_with_empty_buffer_emits_no_batch() {
        let mut b = buffer(6);
        let out = b.handle::<()>(Signal::Completed);
        assert_eq!(out, vec![Signal::Completed]);
    }

    #[test]
    fn failure_discards_pending_and_forwards_error() {
        let metrics = MetricsCollector::new();
        let mut b = buffer(6).with_metrics(metrics.clone());
        b.push(1);
        b.push(2);
        let out = b.handle(Signal::Failed("io"));
        assert_eq!(out, vec![Signal::Failed("io")]);
        assert!(b.is_empty());
        assert_eq!(metrics.counter(names::EVENTS_DISCARDED), 2);
        assert!(b.handle::<&str>(Signal::Next(3)).is_empty());
        assert!(b.handle::<&str>(Signal::Completed).is_empty());
    }

    #[test]
    fn handle_orders_final_batch_before_completion() {
        let mut b = buffer(6);
        b.handle::<()>(Signal::Next(12));
        b.handle::<()>(Signal::Next(13));
        let out = b.handle::<()>(Signal::Completed);
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Signal::Next(batch) if batch.items == vec![12, 13]));
        assert_eq!(out[1], Signal::Completed);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let err = BatchBuffer::<u32>::new(BatchConfig {
            count_threshold: 0,
            timeout_ms: 500,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { component: "batch", .. }));
    }

    #[test]
    fn timeout_flush_logs_at_warn() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut b = buffer(6);
            b.push(1);
            assert!(b.on_tick().is_some());
            assert!(b.on_manual().is_none());
        });

        let text = log.text();
        let timer = text.lines().find(|l| l.contains("flush timer fired")).unwrap();
        assert!(timer.contains("WARN"), "{timer}");
        let manual = text.lines().find(|l| l.contains("manual flush requested")).unwrap();
        assert!(manual.contains("WARN"), "{manual}");
        assert!(!text.contains("batch flushed"));
    }

    #[test]
    fn pending_gauge_tracks_the_buffer() {
        let metrics = MetricsCollector::new();
        let mut b = buffer(3).with_metrics(metrics.clone());
        b.push(1);
        b.push(2);
        assert_eq!(metrics.gauge(names::PENDING_EVENTS), Some(2.0));
        b.push(3);
        assert_eq!(metrics.gauge(names::PENDING_EVENTS), Some(0.0));
        b.push(4);
        b.fail();
        assert_eq!(metrics.gauge(names::PENDING_EVENTS), Some(0.0));
    }

    #[test]
    fn batches_deref_to_slices() {
        let mut b = buffer(2);
        b.push(4);
        let batch = b.push(5).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.iter().sum::<u32>(), 9);
    }
}
