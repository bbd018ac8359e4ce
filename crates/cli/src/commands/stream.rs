//! Mocap and PPG streaming readouts

use std::time::{Duration, Instant};

use anyhow::Result;
use teslasuit_api::DeviceHandle;
use teslasuit_runtime::TeslasuitRuntime;

use crate::commands::{Context, StreamArgs, parse_slot};
use crate::error::CliError;
use crate::output;

/// Execute mocap command
pub fn execute_mocap(ctx: &Context, args: &StreamArgs) -> Result<()> {
    let runtime = ctx.start_runtime()?;
    let device = slot_device(&runtime, args)?;

    let stream = runtime.mocap_stream().map_err(|e| CliError::Device(e.into()))?;
    stream.set_device(device).map_err(CliError::from)?;
    if args.calibrate {
        stream.calibrate().map_err(CliError::from)?;
    }

    every_interval(args, || output::print_mocap(&stream.snapshot(), stream.frame_count(), ctx.json));

    stream.stop().map_err(CliError::from)?;
    Ok(())
}

/// Execute ppg command
pub fn execute_ppg(ctx: &Context, args: &StreamArgs) -> Result<()> {
    let runtime = ctx.start_runtime()?;
    let device = slot_device(&runtime, args)?;

    let stream = runtime.ppg_stream().map_err(|e| CliError::Device(e.into()))?;
    stream.set_device(device).map_err(CliError::from)?;
    if args.calibrate {
        stream.calibrate().map_err(CliError::from)?;
    }

    every_interval(args, || output::print_ppg(stream.snapshot(), ctx.json));

    stream.stop().map_err(CliError::from)?;
    Ok(())
}

fn slot_device(runtime: &TeslasuitRuntime, args: &StreamArgs) -> Result<DeviceHandle> {
    let slot = parse_slot(args.slot)?;
    Ok(runtime
        .slots()
        .device_handle(slot)
        .ok_or(CliError::NoDevice(slot))?)
}

fn every_interval(args: &StreamArgs, mut print: impl FnMut()) {
    let interval = Duration::from_millis(args.interval_ms);
    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    while Instant::now() < deadline {
        std::thread::sleep(interval);
        print();
    }
}
