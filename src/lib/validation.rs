//! Input validation utilities
//!
//! Common validation functions for run parameters with consistent error messages. Every
//! failure is a [`SplitError::InvalidParameter`] naming the offending parameter.

use std::fmt::Display;

use crate::errors::{Result, SplitError};

/// Validate that a value is at least `min`
///
/// # Arguments
/// * `value` - Value to validate
/// * `min` - Smallest accepted value
/// * `name` - Name of the parameter for error messages
///
/// # Errors
/// Returns an error if `value < min`
///
/// # Example
/// ```
/// use shardsplit_lib::validation::validate_at_least;
///
/// validate_at_least(8, 1, "split").unwrap();
///
/// let result = validate_at_least(0, 1, "split");
/// assert!(result.is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_at_least<T: Ord + Display>(value: T, min: T, name: &str) -> Result<()> {
    if value < min {
        return Err(SplitError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be >= {min}, got: {value}"),
        });
    }
    Ok(())
}

/// Validate that a value lies in the inclusive range `[min, max]`
///
/// # Errors
/// Returns an error if the value is outside the range
///
/// # Example
/// ```
/// use shardsplit_lib::validation::validate_range;
///
/// validate_range(6, 1, 9, "compression-level").unwrap();
/// assert!(validate_range(10, 1, 9, "compression-level").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_range<T: Ord + Display>(value: T, min: T, max: T, name: &str) -> Result<()> {
    if value < min || value > max {
        return Err(SplitError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be between {min} and {max}, got: {value}"),
        });
    }
    Ok(())
}

/// Validate a gzip compression level (1-9)
///
/// # Errors
/// Returns an error if the level is outside 1-9
pub fn validate_compression_level(level: u32) -> Result<()> {
    validate_range(level, 1, 9, "compression-level")
}
