//! Counters and distributions for batching and flood-control components.
//!
//! A [`MetricsCollector`] is cheap to clone and shares one underlying
//! registry, so a single collector can be attached to several components
//! (and kept by the caller for reporting).
//!
//! # Overview
//!
//! - [`Metric`] trait defines the interface for custom metrics
//! - [`MetricsCollector`] manages metric registration and collection
//! - [`names`] lists the metrics the built-in components record
//! - Metrics can be logged through `tracing` or saved to a JSON file
//!
//! # Example
//!
//! ```
//! use floodgate::metrics::{names, MetricsCollector};
//! use floodgate::{BatchBuffer, BatchConfig};
//!
//! let metrics = MetricsCollector::new();
//! let mut buffer = BatchBuffer::<u32>::new(BatchConfig::default())
//!     .unwrap()
//!     .with_metrics(metrics.clone());
//!
//! for i in 0..6 {
//!     buffer.push(i);
//! }
//! assert_eq!(metrics.counter(names::BATCHES_EMITTED), 1);
//! ```

use anyhow::Result;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

/// Names of the metrics recorded by the built-in components.
pub mod names {
    /// Batches handed downstream.
    pub const BATCHES_EMITTED: &str = "batches_emitted";
    /// Events carried inside emitted batches.
    pub const EVENTS_BATCHED: &str = "events_batched";
    /// Flush attempts that found the buffer empty.
    pub const EMPTY_FLUSHES: &str = "empty_flushes";
    /// Buffered events thrown away because the source failed.
    pub const EVENTS_DISCARDED: &str = "events_discarded";
    /// Distribution of emitted batch sizes.
    pub const BATCH_SIZE: &str = "batch_size";
    /// Events currently buffered and not yet flushed.
    pub const PENDING_EVENTS: &str = "pending_events";
    /// Events let through by a flood filter.
    pub const EVENTS_FORWARDED: &str = "events_forwarded";
    /// Events suppressed by a flood filter.
    pub const EVENTS_DROPPED: &str = "events_dropped";
    /// Suspension windows opened.
    pub const SUSPENSIONS_STARTED: &str = "suspensions_started";
    /// Events forwarded only because of post-suspension rectification.
    pub const EVENTS_RECTIFIED: &str = "events_rectified";
    /// Events forwarded during detector warm-up.
    pub const WARMUP_EVENTS: &str = "warmup_events";
}

/// Trait for custom metrics.
pub trait Metric: Send + Sync + Any {
    /// The name of this metric (e.g., `events_dropped`).
    fn name(&self) -> &str;

    /// The current value of this metric as a JSON value.
    fn value(&self) -> Value;

    /// Optional description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Cast to Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable cast, used to update built-in metrics in place.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Thread-safe container for component metrics.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

struct MetricsCollectorInner {
    metrics: HashMap<String, Box<dyn Metric>>,
    started_at: Instant,
    finished_at: Option<Instant>,
}

impl MetricsCollector {
    /// Create an empty collector; its clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsCollectorInner {
                metrics: HashMap::new(),
                started_at: Instant::now(),
                finished_at: None,
            })),
        }
    }

    // A panic while holding the lock leaves plain counters behind; they are
    // still meaningful, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, MetricsCollectorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a custom metric, replacing any metric with the same name.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.lock().metrics.insert(metric.name().to_string(), metric);
    }

    /// Mark the observed component as finished (completed, failed or stopped).
    pub fn record_finish(&self) {
        self.lock().finished_at = Some(Instant::now());
    }

    /// Time between collector creation and [`record_finish`](Self::record_finish).
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        inner.finished_at.map(|end| end.duration_since(inner.started_at))
    }

    /// Increment a counter metric by name, creating it on first use.
    ///
    /// A non-counter metric registered under the same name is left untouched.
    pub fn increment_counter(&self, name: &str, by: u64) {
        let mut inner = self.lock();
        match inner.metrics.get_mut(name) {
            Some(metric) => {
                if let Some(counter) = metric.as_any_mut().downcast_mut::<CounterMetric>() {
                    counter.count += by;
                }
            }
            None => {
                inner
                    .metrics
                    .insert(name.to_string(), Box::new(CounterMetric::with_value(name, by)));
            }
        }
    }

    /// Current value of a counter; zero if it was never incremented.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.lock()
            .metrics
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<CounterMetric>())
            .map_or(0, |c| c.count)
    }

    /// Set a gauge metric, creating it on first use.
    ///
    /// A non-gauge metric registered under the same name is left untouched.
    pub fn set_gauge(&self, name: &str, value: f64) {
        let mut inner = self.lock();
        match inner.metrics.get_mut(name) {
            Some(metric) => {
                if let Some(gauge) = metric.as_any_mut().downcast_mut::<GaugeMetric>() {
                    gauge.value = value;
                }
            }
            None => {
                inner
                    .metrics
                    .insert(name.to_string(), Box::new(GaugeMetric::new(name, value)));
            }
        }
    }

    /// Current value of a gauge, if one was set.
    #[must_use]
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.lock()
            .metrics
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<GaugeMetric>())
            .map(|g| g.value)
    }

    /// Statistics of a histogram, if one was recorded.
    #[must_use]
    pub fn histogram(&self, name: &str) -> Option<HistogramStats> {
        self.lock()
            .metrics
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<HistogramMetric>())
            .map(HistogramMetric::stats)
    }

    /// Record one observation into a histogram, creating it on first use.
    pub fn observe(&self, name: &str, value: f64) {
        let mut inner = self.lock();
        let metric = inner
            .metrics
            .entry(name.to_string())
            .or_insert_with(|| Box::new(HistogramMetric::new(name)));
        if let Some(hist) = metric.as_any_mut().downcast_mut::<HistogramMetric>() {
            hist.record(value);
        }
    }

    /// Get all metrics as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut metrics_json = serde_json::Map::new();

        for (name, metric) in &inner.metrics {
            let mut metric_obj = serde_json::Map::new();
            metric_obj.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                metric_obj.insert("description".to_string(), json!(desc));
            }
            metrics_json.insert(name.clone(), Value::Object(metric_obj));
        }

        if let Some(end) = inner.finished_at {
            let elapsed_ms = end.duration_since(inner.started_at).as_millis();
            metrics_json.insert(
                "lifetime_ms".to_string(),
                json!({
                    "value": elapsed_ms,
                    "description": "Time from collector creation to component finish in milliseconds",
                }),
            );
        }
        drop(inner);
        Value::Object(metrics_json)
    }

    /// Log every metric at `info` level, sorted by name.
    pub fn report(&self) {
        let inner = self.lock();
        let mut sorted: Vec<_> = inner.metrics.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);
        for (name, metric) in sorted {
            info!(metric = %name, value = %metric.value(), "metric");
        }
    }

    /// Save all metrics to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json();
        let mut file = File::create(path)?;
        let formatted = serde_json::to_string_pretty(&json)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Get a snapshot of all metric names and values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock()
            .metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.value()))
            .collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("metrics", &self.lock().metrics.len())
            .finish()
    }
}

// ========== Built-in Metrics ==========

/// A simple counter metric.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    /// Create a new counter metric with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    /// Create a counter metric with an initial value.
    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A gauge metric that holds a single numeric value.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A histogram metric that tracks value distribution.
///
/// `count`, `sum`, `min` and `max` cover every observation. Percentiles are
/// computed over the most recent observations only, so memory stays bounded
/// on an unbounded stream.
pub struct HistogramMetric {
    name: String,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    recent: VecDeque<f64>,
    capacity: usize,
}

impl HistogramMetric {
    /// Observations kept for percentile estimates by default.
    pub const DEFAULT_SAMPLE_CAPACITY: usize = 1024;

    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sample_capacity(name, Self::DEFAULT_SAMPLE_CAPACITY)
    }

    /// Keep at most `capacity` recent observations (at least one).
    pub fn with_sample_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.into(),
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            recent: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(value);
    }

    /// Number of observations currently held for percentiles.
    pub fn retained(&self) -> usize {
        self.recent.len()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> HistogramStats {
        if self.count == 0 {
            return HistogramStats::default();
        }

        let mut sorted: Vec<f64> = self.recent.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();

        HistogramStats {
            count: self.count,
            sum: self.sum,
            mean: self.sum / self.count as f64,
            min: self.min,
            max: self.max,
            p50: sorted[n / 2],
            p99: sorted[(n * 99) / 100],
        }
    }
}

impl Metric for HistogramMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        let stats = self.stats();
        json!({
            "count": stats.count,
            "sum": stats.sum,
            "mean": stats.mean,
            "min": stats.min,
            "max": stats.max,
            "p50": stats.p50,
            "p99": stats.p99,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Statistics computed from a histogram.
#[derive(Debug, Clone, Default)]
pub struct HistogramStats {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p99: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_in_place() {
        let metrics = MetricsCollector::new();
        metrics.increment_counter(names::EVENTS_DROPPED, 2);
        metrics.increment_counter(names::EVENTS_DROPPED, 3);
        assert_eq!(metrics.counter(names::EVENTS_DROPPED), 5);
        assert_eq!(metrics.counter(names::EVENTS_FORWARDED), 0);
    }

    #[test]
    fn clones_share_the_registry() {
        let a = MetricsCollector::new();
        let b = a.clone();
        b.increment_counter("x", 1);
        assert_eq!(a.counter("x"), 1);
    }

    #[test]
    fn counter_increment_leaves_other_kinds_alone() {
        let metrics = MetricsCollector::new();
        metrics.set_gauge("g", 1.5);
        metrics.increment_counter("g", 1);
        assert_eq!(metrics.snapshot()["g"], json!(1.5));
    }

    #[test]
    fn histogram_stats() {
        let metrics = MetricsCollector::new();
        for v in [6.0, 4.0, 2.0, 3.0] {
            metrics.observe(names::BATCH_SIZE, v);
        }
        let snap = metrics.snapshot();
        assert_eq!(snap[names::BATCH_SIZE]["count"], json!(4));
        assert_eq!(snap[names::BATCH_SIZE]["min"], json!(2.0));
        assert_eq!(snap[names::BATCH_SIZE]["max"], json!(6.0));
        assert_eq!(snap[names::BATCH_SIZE]["mean"], json!(3.75));
    }

    #[test]
    fn histogram_memory_is_bounded() {
        let mut hist = HistogramMetric::with_sample_capacity(names::BATCH_SIZE, 100);
        for i in 0..100_000 {
            hist.record(f64::from(i % 10));
        }
        hist.record(1_000.0);
        assert_eq!(hist.retained(), 100);

        let stats = hist.stats();
        assert_eq!(stats.count, 100_001);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1_000.0);
        assert_eq!(stats.sum, 450_000.0 + 1_000.0);
        assert_eq!(stats.p99, 1_000.0);
    }

    #[test]
    fn default_histogram_caps_its_samples() {
        let metrics = MetricsCollector::new();
        for _ in 0..(HistogramMetric::DEFAULT_SAMPLE_CAPACITY * 4) {
            metrics.observe(names::BATCH_SIZE, 1.0);
        }
        let inner = metrics.lock();
        let hist = inner.metrics[names::BATCH_SIZE]
            .as_any()
            .downcast_ref::<HistogramMetric>()
            .unwrap();
        assert_eq!(hist.retained(), HistogramMetric::DEFAULT_SAMPLE_CAPACITY);
        drop(inner);
        assert_eq!(
            metrics.histogram(names::BATCH_SIZE).map(|s| s.count),
            Some(HistogramMetric::DEFAULT_SAMPLE_CAPACITY as u64 * 4)
        );
    }

    #[test]
    fn gauges_update_in_place() {
        let metrics = MetricsCollector::new();
        assert_eq!(metrics.gauge(names::PENDING_EVENTS), None);
        metrics.set_gauge(names::PENDING_EVENTS, 3.0);
        metrics.set_gauge(names::PENDING_EVENTS, 1.0);
        assert_eq!(metrics.gauge(names::PENDING_EVENTS), Some(1.0));
        metrics.increment_counter("c", 1);
        metrics.set_gauge("c", 9.0);
        assert_eq!(metrics.counter("c"), 1);
    }

    #[test]
    fn lifetime_only_after_finish() {
        let metrics = MetricsCollector::new();
        assert!(metrics.elapsed().is_none());
        assert!(metrics.to_json().get("lifetime_ms").is_none());
        metrics.record_finish();
        assert!(metrics.elapsed().is_some());
        assert!(metrics.to_json().get("lifetime_ms").is_some());
    }
}
