//! Convenience re-exports for common test utilities.

pub use crate::mock::{ApiCall, MockVendorApi};
pub use crate::must::{must, must_err, must_some};
pub use crate::opener::{MockLibraryOpener, loaded_mock_loader, mock_loader};
pub use crate::wait::wait_until;

/// Result type for tests that use `?`.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
