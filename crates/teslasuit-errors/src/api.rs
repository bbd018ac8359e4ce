//! Failures of calls into the vendor library.

use std::path::PathBuf;

use crate::common::ErrorSeverity;
use crate::status::StatusCode;

/// Errors raised while loading or calling the vendor library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No library is currently loaded.
    #[error("Vendor library is not loaded")]
    NotLoaded,

    /// The loaded library does not export the required entry point.
    #[error("Vendor library does not export `{symbol}`")]
    SymbolUnavailable {
        /// Exported symbol name
        symbol: &'static str,
    },

    /// A vendor call returned a failing status code.
    #[error("{operation} failed with status {code}")]
    Status {
        /// Vendor entry point that failed
        operation: &'static str,
        /// Decoded status
        code: StatusCode,
    },

    /// A vendor call returned a null handle.
    #[error("{operation} returned a null handle")]
    NullHandle {
        /// Vendor entry point that failed
        operation: &'static str,
    },

    /// No install directory is configured and the environment variable is unset.
    #[error("No library directory configured and `{env_var}` is not set")]
    NoLibraryDirectory {
        /// Environment variable consulted
        env_var: String,
    },

    /// The dynamic loader rejected the library file.
    #[error("Failed to load vendor library {}: {reason}", path.display())]
    LibraryLoad {
        /// Full path of the library file
        path: PathBuf,
        /// Loader error text
        reason: String,
    },

    /// The library refused to register a streaming callback.
    #[error("Vendor library rejected callback registration for {operation}")]
    CallbackRejected {
        /// Vendor entry point that failed
        operation: &'static str,
    },
}

impl ApiError {
    /// Get the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ApiError::NotLoaded => ErrorSeverity::Warning,
            ApiError::SymbolUnavailable { .. } => ErrorSeverity::Warning,
            ApiError::Status { code, .. } => code.severity(),
            ApiError::NullHandle { .. } => ErrorSeverity::Error,
            ApiError::NoLibraryDirectory { .. } => ErrorSeverity::Error,
            ApiError::LibraryLoad { .. } => ErrorSeverity::Critical,
            ApiError::CallbackRejected { .. } => ErrorSeverity::Error,
        }
    }

    /// Whether the failure means the vendor capability is absent rather than broken.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ApiError::NotLoaded | ApiError::SymbolUnavailable { .. }
        )
    }

    /// Create a library load error.
    pub fn library_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ApiError::LibraryLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
