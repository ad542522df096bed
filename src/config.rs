//! Component configuration.
//!
//! Both configs are plain serde structs with millisecond fields. They can be
//! built in code (`builder()`), parsed from JSON, or read from the
//! environment; every path ends in [`Validate::validate`].

use crate::error::ConfigError;
use crate::validation::{combine_validations, validators, Validate, ValidationResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_BATCH_COUNT: &str = "FLOODGATE_BATCH_COUNT";
pub const ENV_BATCH_TIMEOUT_MS: &str = "FLOODGATE_BATCH_TIMEOUT_MS";
pub const ENV_FLOOD_MAX_ELEMENTS: &str = "FLOODGATE_FLOOD_MAX_ELEMENTS";
pub const ENV_FLOOD_WINDOW_MS: &str = "FLOODGATE_FLOOD_WINDOW_MS";
pub const ENV_FLOOD_SUSPEND_MS: &str = "FLOODGATE_FLOOD_SUSPEND_MS";

/// Configuration for [`BatchBuffer`](crate::BatchBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Flush as soon as the pending batch holds this many events.
    pub count_threshold: usize,
    /// Period of the flush timer in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count_threshold: 6,
            timeout_ms: 500,
        }
    }
}

impl BatchConfig {
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parse and validate a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.checked()
    }

    /// Read `FLOODGATE_BATCH_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with an explicit variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_BATCH_COUNT)? {
            config.count_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_BATCH_TIMEOUT_MS)? {
            config.timeout_ms = v;
        }
        config.checked()
    }

    pub(crate) fn checked(self) -> Result<Self, ConfigError> {
        self.validate()
            .map_err(|errors| ConfigError::invalid("batch", errors))?;
        Ok(self)
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> ValidationResult {
        combine_validations(vec![
            validators::at_least("count_threshold", self.count_threshold, 1),
            validators::positive_ms("timeout_ms", self.timeout_ms),
        ])
    }
}

/// Fluent builder for [`BatchConfig`].
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    #[must_use]
    pub fn count_threshold(mut self, count: usize) -> Self {
        self.config.count_threshold = count;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn build(self) -> Result<BatchConfig, ConfigError> {
        self.config.checked()
    }
}

/// Configuration for [`FloodFilter`](crate::FloodFilter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodConfig {
    /// Number of consecutive raw events that make up one detection window.
    pub max_elements_per_window: usize,
    /// A full window spanning at most this many milliseconds is a flood.
    pub window_ms: u64,
    /// How long events are suppressed after a flood is detected.
    pub suspend_ms: u64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            max_elements_per_window: 3,
            window_ms: 5_000,
            suspend_ms: 15_000,
        }
    }
}

impl FloodConfig {
    pub fn builder() -> FloodConfigBuilder {
        FloodConfigBuilder::default()
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn suspend(&self) -> Duration {
        Duration::from_millis(self.suspend_ms)
    }

    /// Number of leading events that bypass classification.
    pub fn warmup_len(&self) -> usize {
        self.max_elements_per_window.saturating_sub(1)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.checked()
    }

    /// Read `FLOODGATE_FLOOD_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_FLOOD_MAX_ELEMENTS)? {
            config.max_elements_per_window = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_FLOOD_WINDOW_MS)? {
            config.window_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_FLOOD_SUSPEND_MS)? {
            config.suspend_ms = v;
        }
        config.checked()
    }

    pub(crate) fn checked(self) -> Result<Self, ConfigError> {
        self.validate()
            .map_err(|errors| ConfigError::invalid("flood", errors))?;
        Ok(self)
    }
}

impl Validate for FloodConfig {
    fn validate(&self) -> ValidationResult {
        combine_validations(vec![
            validators::at_least("max_elements_per_window", self.max_elements_per_window, 2),
            validators::positive_ms("window_ms", self.window_ms),
            validators::fits_timeline("window_ms", self.window_ms),
            validators::positive_ms("suspend_ms", self.suspend_ms),
            validators::fits_timeline("suspend_ms", self.suspend_ms),
        ])
    }
}

/// Fluent builder for [`FloodConfig`].
#[derive(Debug, Default)]
pub struct FloodConfigBuilder {
    config: FloodConfig,
}

impl FloodConfigBuilder {
    #[must_use]
    pub fn max_elements_per_window(mut self, n: usize) -> Self {
        self.config.max_elements_per_window = n;
        self
    }

    #[must_use]
    pub fn window(mut self, window: Duration) -> Self {
        self.config.window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn suspend(mut self, suspend: Duration) -> Self {
        self.config.suspend_ms = u64::try_from(suspend.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn build(self) -> Result<FloodConfig, ConfigError> {
        self.config.checked()
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(BatchConfig::default().validate().is_ok());
        assert!(FloodConfig::default().validate().is_ok());
        assert_eq!(FloodConfig::default().warmup_len(), 2);
    }

    #[test]
    fn builder_rejects_zero_threshold_and_timeout() {
        let err = BatchConfig::builder()
            .count_threshold(0)
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err.validation_errors().len(), 2);
    }

    #[test]
    fn flood_requires_window_of_two() {
        let err = FloodConfig::builder()
            .max_elements_per_window(1)
            .build()
            .unwrap_err();
        let errs = err.validation_errors();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field.as_deref(), Some("max_elements_per_window"));
    }

    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let config = FloodConfig::from_json_str(r#"{ "suspend_ms": 30000 }"#).unwrap();
        assert_eq!(config.suspend_ms, 30_000);
        assert_eq!(config.window_ms, 5_000);
        assert_eq!(config.max_elements_per_window, 3);
    }

    #[test]
    fn json_validation_still_applies() {
        let err = BatchConfig::from_json_str(r#"{ "timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { component: "batch", .. }));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = FloodConfig::from_env_with(env(&[
            (ENV_FLOOD_MAX_ELEMENTS, "4"),
            (ENV_FLOOD_WINDOW_MS, " 1000 "),
        ]))
        .unwrap();
        assert_eq!(config.max_elements_per_window, 4);
        assert_eq!(config.window_ms, 1_000);
        assert_eq!(config.suspend_ms, 15_000);

        let batch = BatchConfig::from_env_with(env(&[(ENV_BATCH_COUNT, "10")])).unwrap();
        assert_eq!(batch.count_threshold, 10);
        assert_eq!(batch.timeout_ms, 500);
    }

    #[test]
    fn env_rejects_garbage() {
        let err = BatchConfig::from_env_with(env(&[(ENV_BATCH_TIMEOUT_MS, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Env { var: ENV_BATCH_TIMEOUT_MS, .. }
        ));
    }
}
