//! Construction-time validation for component configuration.
//!
//! Every configuration type implements [`Validate`]. Constructors run it and
//! refuse to build a component from a configuration that reports any error,
//! so misconfiguration surfaces before the first event instead of as odd
//! runtime behavior.
//!
//! # Example
//!
//! ```
//! use floodgate::validation::{validators, combine_validations, Validate, ValidationResult};
//!
//! struct Probe {
//!     samples: usize,
//!     period_ms: u64,
//! }
//!
//! impl Validate for Probe {
//!     fn validate(&self) -> ValidationResult {
//!         combine_validations(vec![
//!             validators::at_least("samples", self.samples, 2),
//!             validators::positive_ms("period_ms", self.period_ms),
//!         ])
//!     }
//! }
//!
//! let errors = Probe { samples: 1, period_ms: 0 }.validate().unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for validation operations.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Trait for types that can be validated.
pub trait Validate {
    /// Validate this instance and return a list of errors if invalid.
    fn validate(&self) -> ValidationResult;
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The field that failed validation (optional)
    pub field: Option<String>,
    /// Human-readable error message
    pub message: String,
    /// Error code for categorization (optional)
    pub code: Option<String>,
}

impl ValidationError {
    /// Create a new validation error with just a message.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: None,
        }
    }

    /// Create a validation error for a specific field.
    pub fn field<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: None,
        }
    }

    /// Create a validation error with an error code.
    #[must_use]
    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref field) = self.field {
            write!(f, "[{}] {}", field, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref code) = self.code {
            write!(f, " (code: {})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validation helpers for common configuration constraints.
pub mod validators {
    use super::{ValidationError, ValidationResult};

    /// Validate that a count is at least `min`.
    pub fn at_least(field: &str, value: usize, min: usize) -> ValidationResult {
        if value >= min {
            Ok(())
        } else {
            Err(vec![
                ValidationError::field(field, format!("must be at least {min}, got {value}"))
                    .with_code("too_small"),
            ])
        }
    }

    /// Validate that a duration in milliseconds is strictly positive.
    pub fn positive_ms(field: &str, value: u64) -> ValidationResult {
        if value > 0 {
            Ok(())
        } else {
            Err(vec![
                ValidationError::field(field, "duration must be positive").with_code("non_positive"),
            ])
        }
    }

    /// Validate that a duration fits the signed millisecond timeline.
    pub fn fits_timeline(field: &str, value: u64) -> ValidationResult {
        if i64::try_from(value).is_ok() {
            Ok(())
        } else {
            Err(vec![
                ValidationError::field(field, format!("must not exceed {} ms", i64::MAX))
                    .with_code("out_of_range"),
            ])
        }
    }
}

/// Combine multiple validation results.
pub fn combine_validations(results: Vec<ValidationResult>) -> ValidationResult {
    let mut all_errors = Vec::new();
    for result in results {
        if let Err(mut errors) = result {
            all_errors.append(&mut errors);
        }
    }
    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}

pub(crate) fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_least_reports_field_and_code() {
        assert!(validators::at_least("n", 2, 2).is_ok());
        let errs = validators::at_least("n", 1, 2).unwrap_err();
        assert_eq!(errs[0].to_string(), "[n] must be at least 2, got 1 (code: too_small)");
    }

    #[test]
    fn combine_keeps_every_error() {
        let combined = combine_validations(vec![
            validators::positive_ms("a", 0),
            validators::positive_ms("b", 10),
            validators::fits_timeline("c", u64::MAX),
        ]);
        let errs = combined.unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].field.as_deref(), Some("a"));
        assert_eq!(errs[1].field.as_deref(), Some("c"));
    }

    #[test]
    fn format_joins_with_commas() {
        let errs = vec![ValidationError::new("x"), ValidationError::field("y", "bad")];
        assert_eq!(format_errors(&errs), "x, [y] bad");
    }
}
