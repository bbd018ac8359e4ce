//! Command implementations for tsctl CLI

pub mod devices;
pub mod play;
pub mod stream;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use teslasuit_device::SlotIndex;
use teslasuit_runtime::{RuntimeConfig, TeslasuitRuntime};
use tracing::debug;

use crate::error::CliError;

/// Global options every command needs.
pub struct Context {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
}

impl Context {
    /// The configuration file if given, else defaults, with the install
    /// directory override applied.
    pub fn runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = match &self.config {
            Some(path) => RuntimeConfig::load_from_path(path).map_err(CliError::from)?,
            None => RuntimeConfig::default(),
        };
        if let Some(dir) = &self.install_dir {
            config.loader.install_dir = Some(dir.clone());
        }
        Ok(config)
    }

    /// Start the runtime and bind every device already attached.
    pub fn start_runtime(&self) -> Result<TeslasuitRuntime> {
        let config = self.runtime_config()?;
        let runtime = TeslasuitRuntime::startup(config)
            .map_err(CliError::Startup)
            .context("Failed to start the Teslasuit runtime")?;
        let delivered = runtime.refresh_devices();
        debug!(delivered, "Initial device refresh complete");
        Ok(runtime)
    }
}

fn parse_slot(raw: u8) -> Result<SlotIndex> {
    SlotIndex::new(raw).map_err(|e| CliError::InvalidArgument(e.to_string()).into())
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DevicesArgs {
    /// Keep running and print connect/disconnect events
    #[arg(short, long)]
    pub watch: bool,

    /// Stop watching after this many seconds
    #[arg(short, long, requires = "watch")]
    pub seconds: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    /// Haptic asset file (.ts_asset)
    pub asset: PathBuf,

    /// Slot of the target device
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..8))]
    pub slot: u8,

    /// Playback time before the player is stopped
    #[arg(short, long, default_value_t = 2.0)]
    pub seconds: f64,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StreamArgs {
    /// Slot of the source device
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..8))]
    pub slot: u8,

    /// Streaming time
    #[arg(short, long, default_value_t = 5)]
    pub seconds: u64,

    /// Calibrate before streaming
    #[arg(long)]
    pub calibrate: bool,

    /// Interval between printed readings in milliseconds
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(50..))]
    pub interval_ms: u64,
}
