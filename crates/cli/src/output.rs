//! Output formatting for CLI responses

use anyhow::Error;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use teslasuit_device::{DeviceId, SlotIndex};
use teslasuit_streaming::{MocapSnapshot, PpgSample};

/// One row of the slot table.
#[derive(Debug, Clone, Serialize)]
pub struct SlotRow {
    pub slot: SlotIndex,
    pub connected: bool,
    pub device_id: Option<DeviceId>,
    pub handle: Option<String>,
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": format!("{error:#}"),
            "exit_code": crate::error::exit_code(error),
        }
    });
    print_json(&error_json);
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

/// Pretty-print any serializable value as one JSON document.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

/// Print one value as a single JSON line, for streaming output.
pub fn print_json_line<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

/// Print the slot table
pub fn print_slots(rows: &[SlotRow], json: bool) {
    if json {
        print_json(&json!({ "success": true, "slots": rows }));
        return;
    }

    if rows.iter().all(|row| !row.connected) {
        println!("{}", "No devices connected".yellow());
        return;
    }

    println!("{}", "Connected Devices:".bold());
    for row in rows.iter().filter(|row| row.connected) {
        let id = row
            .device_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "  {} {} {}",
            format!("[{}]", row.slot).cyan(),
            id.bold(),
            row.handle.as_deref().unwrap_or("-").dimmed()
        );
    }
}

/// Print one connect/disconnect seen while watching
pub fn print_device_change(connected: bool, device_id: DeviceId, slot: Option<SlotIndex>, json: bool) {
    let kind = if connected { "connected" } else { "disconnected" };
    if json {
        print_json_line(&json!({ "event": kind, "device_id": device_id, "slot": slot }));
        return;
    }
    let slot = slot.map_or_else(|| "[-]".to_string(), |slot| format!("[{slot}]"));
    let label = if connected { kind.green() } else { kind.red() };
    println!("{} {} {}", slot.cyan(), label, device_id);
}

/// Print a mocap reading
pub fn print_mocap(snapshot: &MocapSnapshot, frames: u64, json: bool) {
    if json {
        let bones: Vec<_> = snapshot
            .iter()
            .map(|(bone, transform)| {
                json!({
                    "bone": format!("{bone:?}"),
                    "translation": transform.translation,
                    "rotation": transform.rotation,
                })
            })
            .collect();
        print_json_line(&json!({ "frames": frames, "bones": bones }));
        return;
    }

    println!("{} {}", "Frames:".bold(), frames);
    for (bone, transform) in snapshot.iter().take(4) {
        let name = format!("{bone:?}");
        let [x, y, z] = transform.translation;
        println!("  {name:<16} ({x:>8.3}, {y:>8.3}, {z:>8.3})");
    }
}

/// Print a PPG reading
pub fn print_ppg(sample: Option<PpgSample>, json: bool) {
    if json {
        print_json_line(&json!({ "sample": sample }));
        return;
    }
    match sample {
        Some(s) => println!(
            "{} node {}  {} bpm  {}% SpO2",
            "PPG".bold(),
            s.node,
            s.heart_rate.to_string().green(),
            s.oxygen_percent
        ),
        None => println!("{}", "Waiting for PPG data...".yellow()),
    }
}
