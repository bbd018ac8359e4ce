//! Integration tests for tsctl CLI
//!
//! These run the binary without a vendor library installed, so they cover
//! argument handling, configuration errors and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Test helper to create a tsctl command that never sees a real install
fn tsctl(install_dir: &TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tsctl")?;
    cmd.env("TESLASUIT_INSTALL_DIR", install_dir.path())
        .env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_help_lists_commands() -> TestResult {
    let dir = TempDir::new()?;
    tsctl(&dir)?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("mocap"))
        .stdout(predicate::str::contains("ppg"));
    Ok(())
}

#[test]
fn test_missing_library_exits_with_unavailable_code() -> TestResult {
    let dir = TempDir::new()?;
    tsctl(&dir)?
        .arg("devices")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Error:"));
    Ok(())
}

#[test]
fn test_json_error_output_is_parseable() -> TestResult {
    let dir = TempDir::new()?;
    let output = tsctl(&dir)?.args(["devices", "--json"]).output()?;
    assert_eq!(output.status.code(), Some(5));

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["success"], Value::Bool(false));
    assert_eq!(value["error"]["exit_code"], Value::from(5));
    Ok(())
}

#[test]
fn test_missing_asset_is_invalid_input() -> TestResult {
    let dir = TempDir::new()?;
    let asset = dir.path().join("absent.ts_asset");
    tsctl(&dir)?
        .arg("play")
        .arg(&asset)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("absent.ts_asset"));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let config = dir.path().join("bridge.yaml");
    std::fs::write(&config, "discovery:\n  poll_interval_ms: 1\n")?;
    tsctl(&dir)?
        .arg("--config")
        .arg(&config)
        .arg("devices")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("poll_interval_ms"));
    Ok(())
}

#[test]
fn test_unsupported_config_format_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let config = dir.path().join("bridge.toml");
    std::fs::write(&config, "")?;
    tsctl(&dir)?
        .arg("--config")
        .arg(&config)
        .arg("devices")
        .assert()
        .code(4);
    Ok(())
}

#[test]
fn test_negative_play_duration_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    tsctl(&dir)?
        .args(["play", "pulse.ts_asset", "--seconds=-1"])
        .assert()
        .code(4);
    Ok(())
}

#[test]
fn test_completion_generates_script() -> TestResult {
    let dir = TempDir::new()?;
    tsctl(&dir)?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tsctl"));
    Ok(())
}
