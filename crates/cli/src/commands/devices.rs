//! Device listing and watching

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use crossbeam::channel;
use teslasuit_device::{DeviceId, SlotIndex, SubscriberId};
use teslasuit_runtime::TeslasuitRuntime;

use crate::commands::{Context, DevicesArgs};
use crate::output::{self, SlotRow};

const DISPATCH_WAIT: Duration = Duration::from_millis(200);

/// Execute devices command
pub fn execute(ctx: &Context, args: &DevicesArgs) -> Result<()> {
    let runtime = ctx.start_runtime()?;
    output::print_slots(&slot_rows(&runtime), ctx.json);
    if args.watch {
        watch(&runtime, ctx.json, args.seconds.map(Duration::from_secs))?;
    }
    Ok(())
}

fn slot_rows(runtime: &TeslasuitRuntime) -> Vec<SlotRow> {
    SlotIndex::all()
        .map(|slot| {
            let record = runtime.slots().device(slot);
            SlotRow {
                slot,
                connected: record.is_connected(),
                device_id: record.is_connected().then_some(record.id()),
                handle: record.handle().map(|h| h.to_string()),
            }
        })
        .collect()
}

enum Change {
    Connected(DeviceId),
    Disconnected(DeviceId),
}

/// Print connect/disconnect events until `limit` elapses, or forever.
fn watch(runtime: &TeslasuitRuntime, json: bool, limit: Option<Duration>) -> Result<()> {
    let provider = runtime
        .provider()
        .ok_or_else(|| anyhow!("Device discovery is not running"))?;
    provider.start();

    if !json {
        println!("Watching for device changes (Press Ctrl+C to stop)");
    }

    let key = SubscriberId::unique();
    let (tx, rx) = channel::unbounded();
    let connect_tx = tx.clone();
    provider.subscribe_on_connect(key, move |id, _| {
        if connect_tx.send(Change::Connected(id)).is_err() {
            tracing::debug!(device_id = %id, "Watch channel closed");
        }
    });
    provider.subscribe_on_disconnect(key, move |id| {
        if tx.send(Change::Disconnected(id)).is_err() {
            tracing::debug!(device_id = %id, "Watch channel closed");
        }
    });

    let deadline = limit.map(|limit| Instant::now() + limit);
    while deadline.is_none_or(|deadline| Instant::now() < deadline) {
        provider.dispatch_timeout(DISPATCH_WAIT);
        // Slots are resolved after dispatch so the slot manager has run.
        for change in rx.try_iter() {
            match change {
                Change::Connected(id) => {
                    output::print_device_change(true, id, runtime.slots().slot_of(id), json);
                }
                Change::Disconnected(id) => {
                    output::print_device_change(false, id, runtime.slots().remembered_slot(id), json);
                }
            }
        }
    }

    provider.unsubscribe_on_connect(key);
    provider.unsubscribe_on_disconnect(key);
    Ok(())
}
