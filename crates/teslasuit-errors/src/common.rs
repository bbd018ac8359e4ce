//! Umbrella error type and classification shared by every bridge crate.

use core::fmt;

use crate::{ApiError, DeviceError, HapticError, ValidationError};

/// Top-level error type wrapping every sub-error.
#[derive(Debug, thiserror::Error)]
pub enum TeslasuitError {
    /// Vendor library errors
    #[error("Vendor API error: {0}")]
    Api(#[from] ApiError),

    /// Discovery and slot errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Haptic asset and playback errors
    #[error("Haptic error: {0}")]
    Haptic(#[from] HapticError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TeslasuitError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TeslasuitError::Api(_) => ErrorCategory::Api,
            TeslasuitError::Device(_) => ErrorCategory::Device,
            TeslasuitError::Haptic(_) => ErrorCategory::Haptic,
            TeslasuitError::Validation(_) => ErrorCategory::Validation,
            TeslasuitError::Io(_) => ErrorCategory::IO,
            TeslasuitError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TeslasuitError::Api(e) => e.severity(),
            TeslasuitError::Device(e) => e.severity(),
            TeslasuitError::Haptic(e) => e.severity(),
            TeslasuitError::Validation(e) => e.severity(),
            TeslasuitError::Io(_) => ErrorSeverity::Error,
            TeslasuitError::Config(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        TeslasuitError::Config(msg.into())
    }
}

impl From<std::io::Error> for TeslasuitError {
    fn from(e: std::io::Error) -> Self {
        TeslasuitError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Vendor library errors
    Api = 0,
    /// Discovery and slot errors
    Device = 1,
    /// Haptic errors
    Haptic = 2,
    /// Configuration errors
    Config = 3,
    /// I/O errors
    IO = 4,
    /// Validation errors
    Validation = 5,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Api => write!(f, "Api"),
            ErrorCategory::Device => write!(f, "Device"),
            ErrorCategory::Haptic => write!(f, "Haptic"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Validation => write!(f, "Validation"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, bridge state may be unusable
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_follows_variant() {
        let err: TeslasuitError = ApiError::NotLoaded.into();
        assert_eq!(err.category(), ErrorCategory::Api);
        assert!(err.is_recoverable());

        let err: TeslasuitError = DeviceError::ThreadSpawn("no threads".into()).into();
        assert_eq!(err.category(), ErrorCategory::Device);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }
}
