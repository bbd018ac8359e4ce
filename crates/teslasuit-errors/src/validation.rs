//! Validation errors for caller input and configuration values.

use crate::common::ErrorSeverity;

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Argument rejected.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument {
        /// Field or parameter name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// Value outside the accepted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Field or parameter name
        field: String,
        /// Value supplied
        value: String,
        /// Minimum accepted value
        min: String,
        /// Maximum accepted value
        max: String,
    },

    /// Required field missing.
    #[error("Required field missing: {0}")]
    Required(String),
}

impl ValidationError {
    /// Get the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    /// Create an invalid argument error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an out of range error.
    pub fn out_of_range<T: core::fmt::Display>(
        field: impl Into<String>,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Create a required field error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required(field.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ValidationError::out_of_range("poll_interval_ms", 5_u64, 10, 60_000);
        assert_eq!(
            err.to_string(),
            "poll_interval_ms must be between 10 and 60000, got 5"
        );
    }
}
