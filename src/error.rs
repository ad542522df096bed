//! Error types for configuration and channel plumbing.
//!
//! Runtime stream errors are not defined here: they are the source's own
//! error type `E`, carried verbatim in [`Signal::Failed`](crate::Signal::Failed).

use crate::validation::{ValidationError, format_errors};
use thiserror::Error;

/// Errors raised while building a component from its configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more fields violate their constraints.
    #[error("invalid {component} configuration: {}", format_errors(.errors))]
    Invalid {
        component: &'static str,
        errors: Vec<ValidationError>,
    },

    /// An environment variable is set but cannot be parsed.
    #[error("environment variable {var}={value:?} is not a valid value")]
    Env { var: &'static str, value: String },

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(component: &'static str, errors: Vec<ValidationError>) -> Self {
        ConfigError::Invalid { component, errors }
    }

    /// The individual validation failures, if this is an `Invalid` error.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            ConfigError::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Sending into a component whose input side has shut down.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("receiver is closed")]
pub struct SendError;
