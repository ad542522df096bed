//! # Floodgate
//!
//! **Adaptive batching and flood suspension** for in-process event streams.
//!
//! Floodgate provides two independent components that sit between an event
//! source and its consumer:
//!
//! - **[`BatchBuffer`]** groups events into batches and flushes when a
//!   count threshold is reached, when a periodic timer ticks, or when a
//!   manual flush is requested.
//! - **[`FloodFilter`]** watches a sliding window over the last N raw
//!   arrivals and, when N events land within the window duration, swallows
//!   everything for a suspension period.
//!
//! ## Key Features
//!
//! - **Three flush triggers** - count, timeout and manual, all acting on one batch
//! - **Sliding-window detection** - over raw arrivals, independent of what was forwarded
//! - **Overlap stitching** - back-to-back floods read as one continuous drop period
//! - **Rectification** - optional correction of post-suspension classifications
//! - **Deterministic core** - pure state machines, time is always injected
//! - **Tokio drivers** - one task per instance, paused-time friendly (feature `runtime`)
//!
//! ## Quick Start
//!
//! ```
//! use floodgate::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! // Batching
//! let mut buffer = BatchBuffer::new(BatchConfig::default())?;
//! let full: Vec<_> = (0..10).filter_map(|i| buffer.push(i)).collect();
//! assert_eq!(full[0].items, vec![0, 1, 2, 3, 4, 5]);
//! assert_eq!(buffer.complete().map(Batch::into_items), Some(vec![6, 7, 8, 9]));
//!
//! // Flood suspension: 3 events within 5s suspend for 15s
//! let arrivals = [2, 12, 23, 25, 27, 29, 31, 40, 50]
//!     .iter()
//!     .zip(1..)
//!     .map(|(s, id)| Timestamped::new(s * 1_000, id));
//! let kept: Vec<u32> = suspend_during_flood(arrivals, FloodConfig::default(), RectifyMode::Plain)?;
//! assert_eq!(kept, vec![1, 2, 3, 4, 9]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Signals
//!
//! Streams are modelled as [`Signal`]s: any number of `Next` values followed
//! by at most one terminal `Completed` or `Failed`. Both components forward
//! the terminal signal exactly once and ignore anything after it. On
//! completion the batch buffer flushes its remainder first; on failure it
//! discards it.
//!
//! ### Detection and reduction
//!
//! Flood suspension is split in two:
//! - [`FloodDetector`](flood::FloodDetector) classifies each arrival as
//!   [`Classification::Value`] or [`Classification::Suspend`];
//! - [`ReducerState::step`] folds classifications into forward/drop
//!   [`Verdict`]s, carrying only the current suspension window between steps.
//!
//! ### Time
//!
//! Timestamps are [`TimestampMs`] readings of an injected [`Clock`]. In
//! the tokio drivers, [`TimestampingSender`](runtime::TimestampingSender)
//! stamps values as they are produced and
//! [`TokioClock`](runtime::TokioClock) follows tokio's paused test clock.
//!
//! ## Feature Flags
//!
//! - `runtime` (default) - tokio task drivers, channels and tickers
//!
//! ## Module Overview
//!
//! - [`batch`] - batching state machine
//! - [`flood`] - detector, reducer and filter
//! - [`config`] - configuration, builders, env and JSON loading
//! - [`metrics`] - counters and histograms for both components
//! - [`runtime`] - tokio drivers
//! - [`testing`] - assertions, arrival builders and scenario fixtures

pub mod batch;
pub mod clock;
pub mod config;
pub mod error;
pub mod flood;
pub mod logging;
pub mod metrics;
#[cfg(feature = "runtime")]
pub mod runtime;
pub mod signal;
pub mod testing;
pub mod validation;
pub mod window;

pub use batch::{Batch, BatchBuffer, FlushTrigger};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{BatchConfig, FloodConfig};
pub use error::{ConfigError, SendError};
pub use flood::{
    suspend_during_flood, DropReason, FloodFilter, Offer, ReducerState, RectifyMode, Verdict,
};
pub use metrics::MetricsCollector;
pub use signal::Signal;
pub use validation::{Validate, ValidationError};
pub use window::{Classification, Classified, TimestampMs, Timestamped, Window};
