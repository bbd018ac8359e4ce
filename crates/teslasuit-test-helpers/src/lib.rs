//! Shared test utilities for the Teslasuit bridge.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]`
//! - [`mock`] - [`MockVendorApi`](mock::MockVendorApi), a scriptable vendor library
//! - [`opener`] - [`MockLibraryOpener`](opener::MockLibraryOpener) and loader shortcuts
//! - [`wait`] - Polling helpers for threaded tests
//! - [`prelude`] - Convenience re-exports
//!
//! ```rust,ignore
//! use teslasuit_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(
    clippy::unwrap_used,
    clippy::panic,
    reason = "test support code reports failures by panicking"
)]

pub mod mock;
pub mod must;
pub mod opener;
pub mod prelude;
pub mod wait;

pub use must::*;
