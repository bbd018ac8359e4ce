//! Prelude module for convenient error handling imports.
//!
//! # Example
//!
//! ```
//! use teslasuit_errors::prelude::*;
//!
//! fn slot_from(raw: u8) -> Result<u8> {
//!     if raw >= 8 {
//!         return Err(ValidationError::out_of_range("slot", raw, 0, 7).into());
//!     }
//!     Ok(raw)
//! }
//!
//! assert!(slot_from(3).is_ok());
//! assert!(slot_from(9).is_err());
//! ```

pub use crate::{
    ApiResult, Result,
    api::ApiError,
    common::{ErrorCategory, ErrorSeverity, TeslasuitError},
    device::DeviceError,
    haptic::HapticError,
    status::StatusCode,
    validation::ValidationError,
};
