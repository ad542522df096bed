//! Tokio drivers.
//!
//! Each component instance runs on its own task and owns its state
//! exclusively; sources, tick sources and manual flush requests reach it
//! through channels and are applied one at a time.
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use floodgate::runtime::{channel, spawn_batcher, ManualTicker};
//! use floodgate::{BatchBuffer, BatchConfig, FlushTrigger, Signal};
//! use tokio::sync::mpsc;
//!
//! let (tx, rx) = channel::<u32, ()>();
//! let (ticker, _tick) = ManualTicker::new();
//! let (_flush, manual) = mpsc::unbounded_channel();
//! let buffer = BatchBuffer::new(BatchConfig::default()).unwrap();
//! let mut batcher = spawn_batcher(buffer, rx, ticker, manual);
//!
//! tx.next(1).unwrap();
//! tx.complete().unwrap();
//! match batcher.recv().await {
//!     Some(Signal::Next(batch)) => assert_eq!(batch.trigger, FlushTrigger::Completion),
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert_eq!(batcher.recv().await, Some(Signal::Completed));
//! # }
//! ```

mod batcher;
pub mod channel;
mod filter;
mod ticker;

pub use batcher::{spawn_batcher, BatcherHandle};
pub use channel::{channel, SignalReceiver, SignalSender, TimestampingSender};
pub use filter::{spawn_flood_filter, FilterHandle};
pub use ticker::{IntervalTicker, ManualTicker, NeverTicker, TickHandle, TickSource, TokioClock};
