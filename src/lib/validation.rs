//! Input validation utilities
//!
//! Common checks for command-line and configuration parameters, returning
//! [`PipelineError::InvalidParameter`] with a consistent message.

use std::fmt::Display;

use crate::errors::{PipelineError, Result};

/// Validate that a count is at least one
///
/// # Errors
/// Returns an error if `value` is zero
///
/// # Example
/// ```
/// use transcoda_lib::validation::validate_positive;
///
/// assert!(validate_positive(2, "queue-capacity").is_ok());
/// assert!(validate_positive(0, "queue-capacity").is_err());
/// ```
pub fn validate_positive(value: usize, name: &str) -> Result<()> {
    if value == 0 {
        return Err(PipelineError::InvalidParameter {
            parameter: name.to_string(),
            reason: "must be >= 1".to_string(),
        });
    }
    Ok(())
}

/// Validate that `min <= value <= max`
///
/// # Errors
/// Returns an error if the value is outside the inclusive range
///
/// # Example
/// ```
/// use transcoda_lib::validation::validate_range;
///
/// assert!(validate_range(5, 1, 10, "views").is_ok());
/// assert!(validate_range(11, 1, 10, "views").is_err());
/// ```
pub fn validate_range<T: PartialOrd + Display>(value: T, min: T, max: T, name: &str) -> Result<()> {
    if value < min || value > max {
        return Err(PipelineError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("{value} must be between {min} and {max}"),
        });
    }
    Ok(())
}

/// Validate that max >= min for optional max values
///
/// # Errors
/// Returns an error if max < min
///
/// # Example
/// ```
/// use transcoda_lib::validation::validate_min_max;
///
/// validate_min_max(1, Some(10), "min-delay-ms", "max-delay-ms").unwrap();
/// validate_min_max(1, None, "min-delay-ms", "max-delay-ms").unwrap();
/// assert!(validate_min_max(10, Some(5), "min-delay-ms", "max-delay-ms").is_err());
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn validate_min_max<T: Ord + Display>(
    min_val: T,
    max_val: Option<T>,
    min_name: &str,
    max_name: &str,
) -> Result<()> {
    if let Some(max) = max_val
        && max < min_val
    {
        return Err(PipelineError::InvalidParameter {
            parameter: max_name.to_string(),
            reason: format!("{max_name} ({max}) must be >= {min_name} ({min_val})"),
        });
    }
    Ok(())
}
