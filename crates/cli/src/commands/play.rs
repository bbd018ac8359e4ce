//! One-shot haptic playback

use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use teslasuit_haptics::{ASSET_EXTENSION, HapticAsset};
use tracing::{info, warn};

use crate::commands::{Context, PlayArgs, parse_slot};
use crate::error::CliError;
use crate::output;

/// Execute play command
pub fn execute(ctx: &Context, args: &PlayArgs) -> Result<()> {
    let duration = Duration::try_from_secs_f64(args.seconds).map_err(|e| {
        CliError::InvalidArgument(format!("seconds {}: {e}", args.seconds))
    })?;
    let slot = parse_slot(args.slot)?;
    if args.asset.extension().and_then(|e| e.to_str()) != Some(ASSET_EXTENSION) {
        warn!(path = %args.asset.display(), "Asset file does not have the .{ASSET_EXTENSION} extension");
    }
    let asset = HapticAsset::from_file(&args.asset).map_err(CliError::from)?;

    let runtime = ctx.start_runtime()?;
    if runtime.slots().device_handle(slot).is_none() {
        return Err(CliError::NoDevice(slot).into());
    }

    let name = asset.name().to_string();
    let mut player = runtime.haptic_player(vec![asset], slot);
    player.play(0).map_err(CliError::from)?;
    info!(asset = %name, slot = %slot, "Playing haptic asset");
    if !ctx.json {
        println!("Playing {name} on slot {slot} for {:.1}s", args.seconds);
    }

    std::thread::sleep(duration);

    player.stop_player().map_err(CliError::from)?;
    player.end();

    if ctx.json {
        output::print_json(&json!({
            "success": true,
            "asset": name,
            "slot": slot,
            "seconds": args.seconds,
        }));
    }
    Ok(())
}
