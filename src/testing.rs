//! Testing utilities for batching and flood suspension.
//!
//! - **Assertions**: compare batches, check subsequence and terminal-signal rules
//! - **Builders**: describe arrivals as gaps, get timestamps or replay steps
//! - **Fixtures**: reference scenarios with their expected outputs
//!
//! # Quick Start
//!
//! ```
//! use floodgate::testing::*;
//! use floodgate::{suspend_during_flood, RectifyMode};
//!
//! let arrivals = overlap_stitching_arrivals();
//! let input: Vec<u32> = arrivals.iter().map(|a| a.value).collect();
//! let output = suspend_during_flood(arrivals, flood_config(), RectifyMode::Plain).unwrap();
//!
//! assert_collections_equal(&output, &OVERLAP_EXPECTED_PLAIN);
//! assert_order_preserving_subsequence(&output, &input);
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
