//! Centralized error types for the Teslasuit bridge
//!
//! Every crate in the workspace reports failures through the types in this
//! crate. Nothing here panics: failures are values, logged at the call site
//! and returned to the caller unchanged.
//!
//! # Architecture
//!
//! - [`status`]: the vendor library's integer status codes
//! - [`api`]: capability failures (library not loaded, symbol missing,
//!   vendor call returned a bad status or a null handle)
//! - [`device`]: discovery and slot bookkeeping violations
//! - [`haptic`]: asset and playable bookkeeping violations
//! - [`validation`]: malformed caller input
//! - [`common`]: the umbrella [`TeslasuitError`] and its classification
//!
//! # Example
//!
//! ```
//! use teslasuit_errors::prelude::*;
//!
//! fn check(code: i32) -> Result<()> {
//!     StatusCode::from_raw(code).into_result("ts_haptic_play_playable")?;
//!     Ok(())
//! }
//!
//! assert!(check(0).is_ok());
//! assert!(check(i32::MIN).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod common;
pub mod device;
pub mod haptic;
pub mod prelude;
pub mod status;
pub mod validation;

pub use api::ApiError;
pub use common::{ErrorCategory, ErrorSeverity, TeslasuitError};
pub use device::DeviceError;
pub use haptic::HapticError;
pub use status::StatusCode;
pub use validation::ValidationError;

/// A specialized `Result` type for bridge operations.
pub type Result<T> = std::result::Result<T, TeslasuitError>;

/// A specialized `Result` type for calls into the vendor library.
pub type ApiResult<T = ()> = std::result::Result<T, ApiError>;
