//! Error types for tsctl CLI

use teslasuit_device::SlotIndex;
use teslasuit_errors::{HapticError, TeslasuitError};
use teslasuit_runtime::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No device in slot {0}")]
    NoDevice(SlotIndex),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Asset error: {0}")]
    Asset(#[from] HapticError),

    #[error("Vendor library unavailable: {0}")]
    Startup(#[source] TeslasuitError),

    #[error(transparent)]
    Device(#[from] TeslasuitError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process exit code for a failed command.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<CliError>() {
        Some(CliError::NoDevice(_)) => 2,
        Some(CliError::InvalidArgument(_) | CliError::Config(_) | CliError::Asset(_)) => 4,
        Some(CliError::Startup(_)) => 5,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use teslasuit_errors::ApiError;

    #[test]
    fn exit_codes_survive_context() {
        let err: anyhow::Result<()> = Err(CliError::Startup(ApiError::NotLoaded.into()).into());
        let err = err.context("Failed to start");
        assert!(matches!(err, Err(ref e) if exit_code(e) == 5));
    }

    #[test]
    fn unknown_errors_exit_with_one() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(exit_code(&err), 1);
        assert_eq!(exit_code(&CliError::NoDevice(SlotIndex::FIRST).into()), 2);
        assert_eq!(exit_code(&CliError::InvalidArgument("x".into()).into()), 4);
    }
}
