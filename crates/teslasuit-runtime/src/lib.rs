//! Process-wide lifecycle of the Teslasuit bridge.
//!
//! [`TeslasuitRuntime`] wires the crates together in the order the vendor
//! library requires and tears them down in reverse; [`RuntimeConfig`] is
//! its YAML or JSON configuration file.
//!
//! ```rust,ignore
//! use teslasuit_runtime::{RuntimeConfig, TeslasuitRuntime};
//!
//! let config = RuntimeConfig::load_from_path("teslasuit.yaml")?;
//! let mut runtime = TeslasuitRuntime::startup(config)?;
//! runtime.refresh_devices();
//! runtime.shutdown();
//! ```

#![deny(clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod runtime;

pub use config::{ConfigError, ConfigFormat, RuntimeConfig};
pub use runtime::TeslasuitRuntime;
