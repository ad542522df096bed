//! Reference scenarios with their expected outputs.
//!
//! All flood fixtures use [`flood_config`]: windows of 3 arrivals, a 5s
//! detection window and a 15s suspension. Arrivals are numbered from 1.

use super::builders::ArrivalScriptBuilder;
use crate::config::{BatchConfig, FloodConfig};
use crate::window::Timestamped;

/// Gaps (seconds) of the basic scenario; arrivals land at
/// 2, 12, 23, 25, 27, 29, 31, 40 and 50 s.
pub const BASIC_FLOOD_GAPS_SECS: [u64; 9] = [2, 10, 11, 2, 2, 2, 2, 9, 10];
/// The flood completes on arrival 5; 6 to 8 fall inside the suspension.
pub const BASIC_FLOOD_EXPECTED: [u32; 5] = [1, 2, 3, 4, 9];

/// Arrivals at 0, 1, 2, 15, 16, 17, 20, 31 and 40 s. The second flood is
/// detected at 17s, exactly when the first suspension ends.
pub const OVERLAP_GAPS_SECS: [u64; 9] = [0, 1, 1, 13, 1, 1, 3, 11, 9];
pub const OVERLAP_EXPECTED_PLAIN: [u32; 3] = [1, 2, 9];
pub const OVERLAP_EXPECTED_RECTIFYING: [u32; 6] = [1, 2, 6, 7, 8, 9];

/// Arrivals at 0, 1, 2, 16, 17, 18, 19, 20 and 40 s. The detection windows
/// of arrivals 5 and 6 still include arrival 4, which was swallowed.
pub const RECTIFICATION_GAPS_SECS: [u64; 9] = [0, 1, 1, 14, 1, 1, 1, 1, 20];
pub const RECTIFICATION_EXPECTED_PLAIN: [u32; 4] = [1, 2, 5, 9];
pub const RECTIFICATION_EXPECTED_RECTIFYING: [u32; 5] = [1, 2, 5, 6, 9];

#[must_use]
pub fn flood_config() -> FloodConfig {
    FloodConfig::default()
}

/// Count threshold 6, timeout 500ms.
#[must_use]
pub fn batch_config() -> BatchConfig {
    BatchConfig::default()
}

#[must_use]
pub fn basic_flood_arrivals() -> Vec<Timestamped<u32>> {
    ArrivalScriptBuilder::numbered_secs(&BASIC_FLOOD_GAPS_SECS).build()
}

#[must_use]
pub fn overlap_stitching_arrivals() -> Vec<Timestamped<u32>> {
    ArrivalScriptBuilder::numbered_secs(&OVERLAP_GAPS_SECS).build()
}

#[must_use]
pub fn rectification_arrivals() -> Vec<Timestamped<u32>> {
    ArrivalScriptBuilder::numbered_secs(&RECTIFICATION_GAPS_SECS).build()
}

/// Events `0..15` of the end-to-end batching scenario, split by the trigger
/// expected to flush them: count, timeout, manual, completion.
#[must_use]
pub fn batching_phases() -> [Vec<u32>; 4] {
    [(0..6).collect(), (6..10).collect(), (10..12).collect(), (12..15).collect()]
}
