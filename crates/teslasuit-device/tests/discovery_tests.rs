//! Discovery poller and slot manager scenarios against the mock vendor API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use teslasuit_api::ffi::symbols;
use teslasuit_api::{DeviceHandle, LibraryLoader};
use teslasuit_device::{
    DeviceId, DeviceProvider, DeviceSlotManager, DiscoveryConfig, SLOT_COUNT, SlotEvent,
    SubscriberId,
};
use teslasuit_errors::StatusCode;
use teslasuit_test_helpers::prelude::*;

const SUIT_A: [u8; 16] = [0xA1; 16];
const SUIT_B: [u8; 16] = [0xB2; 16];

fn manual_config() -> DiscoveryConfig {
    // Long enough that the background thread never ticks during a test.
    DiscoveryConfig {
        poll_interval_ms: 60_000,
        device_list_capacity: 16,
    }
}

fn provider_with(api: &Arc<MockVendorApi>) -> Result<DeviceProvider, Box<dyn std::error::Error>> {
    let loader: Arc<LibraryLoader> = loaded_mock_loader(Arc::clone(api));
    Ok(DeviceProvider::new(loader, manual_config())?)
}

type ConnectLog = Arc<Mutex<Vec<(DeviceId, DeviceHandle)>>>;

fn record_connects(provider: &DeviceProvider) -> ConnectLog {
    let log: ConnectLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    provider.subscribe_on_connect(SubscriberId::new(1), move |id, handle| {
        sink.lock().push((id, handle));
    });
    log
}

#[test]
fn test_two_devices_in_one_tick_connect_once_each() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    api.attach(SUIT_B);
    let provider = provider_with(&api)?;
    let connects = record_connects(&provider);
    let slots = DeviceSlotManager::new();
    slots.initialize(&provider);

    assert_eq!(provider.poll_now(), 2);
    assert_eq!(provider.dispatch_pending(), 2);

    let seen = connects.lock().clone();
    assert_eq!(seen.len(), 2);
    let (first, second) = (seen.first().ok_or("missing")?, seen.get(1).ok_or("missing")?);
    assert_ne!(first.0, second.0);
    assert_ne!(first.1, second.1);

    let bound = slots.connected_slots();
    assert_eq!(bound.len(), 2);
    assert!(bound.iter().all(|slot| slot.index() < SLOT_COUNT));
    Ok(())
}

#[test]
fn test_still_present_device_does_not_reconnect() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    let provider = provider_with(&api)?;
    let connects = record_connects(&provider);

    provider.poll_now();
    provider.dispatch_pending();
    assert_eq!(provider.poll_now(), 0);
    assert_eq!(provider.dispatch_pending(), 0);

    assert_eq!(connects.lock().len(), 1);
    assert_eq!(api.open_count(), 1);
    Ok(())
}

#[test]
fn test_pending_connect_is_not_queued_twice() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    let provider = provider_with(&api)?;

    assert_eq!(provider.poll_now(), 1);
    assert_eq!(provider.poll_now(), 0);
    assert_eq!(provider.pending_events(), 1);
    assert_eq!(provider.dispatch_pending(), 1);
    Ok(())
}

#[test]
fn test_failed_open_is_retried_next_tick() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    api.fail_open(SUIT_A, true);
    let provider = provider_with(&api)?;
    let connects = record_connects(&provider);

    provider.poll_now();
    provider.dispatch_pending();
    assert!(provider.device_ids().is_empty());
    assert!(connects.lock().is_empty());

    api.fail_open(SUIT_A, false);
    assert_eq!(provider.poll_now(), 1);
    provider.dispatch_pending();
    assert!(provider.is_connected(DeviceId::from_bytes(SUIT_A)));
    assert_eq!(connects.lock().len(), 1);
    Ok(())
}

#[test]
fn test_detach_fires_disconnect_and_frees_slot() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    let provider = provider_with(&api)?;
    let slots = DeviceSlotManager::new();
    slots.initialize(&provider);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    slots.subscribe(SubscriberId::new(5), move |event| sink.lock().push(event));

    provider.poll_now();
    provider.dispatch_pending();
    let id = DeviceId::from_bytes(SUIT_A);
    let slot = slots.slot_of(id).ok_or("device has no slot")?;

    api.detach(SUIT_A);
    provider.poll_now();
    provider.dispatch_pending();

    assert!(!provider.is_connected(id));
    assert_eq!(slots.slot_of(id), None);
    assert_eq!(slots.remembered_slot(id), Some(slot));
    assert_eq!(
        *events.lock(),
        vec![SlotEvent::Connected(slot), SlotEvent::Disconnected(slot)]
    );
    Ok(())
}

#[test]
fn test_reattached_device_returns_to_its_slot() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    api.attach(SUIT_B);
    let provider = provider_with(&api)?;
    let slots = DeviceSlotManager::new();
    slots.initialize(&provider);
    provider.poll_now();
    provider.dispatch_pending();
    let id_b = DeviceId::from_bytes(SUIT_B);
    let original = slots.slot_of(id_b).ok_or("device has no slot")?;

    api.detach(SUIT_B);
    provider.poll_now();
    provider.dispatch_pending();
    api.attach(SUIT_B);
    provider.poll_now();
    provider.dispatch_pending();

    assert_eq!(slots.slot_of(id_b), Some(original));
    Ok(())
}

#[test]
fn test_manager_created_late_replays_connected_devices() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    let provider = provider_with(&api)?;
    provider.poll_now();
    provider.dispatch_pending();

    let slots = DeviceSlotManager::new();
    slots.initialize(&provider);
    assert_eq!(slots.connected_slots().len(), 1);

    // Re-initializing skips devices that already hold a slot.
    slots.initialize(&provider);
    assert_eq!(slots.connected_slots().len(), 1);
    Ok(())
}

#[test]
fn test_ninth_device_gets_no_slot() -> TestResult {
    let api = MockVendorApi::shared();
    for n in 0..=SLOT_COUNT {
        api.attach([u8::try_from(n)?.wrapping_add(1); 16]);
    }
    let provider = provider_with(&api)?;
    let slots = DeviceSlotManager::new();
    slots.initialize(&provider);

    provider.poll_now();
    provider.dispatch_pending();

    assert_eq!(provider.device_ids().len(), SLOT_COUNT + 1);
    assert_eq!(slots.connected_slots().len(), SLOT_COUNT);
    let last = DeviceId::from_bytes([u8::try_from(SLOT_COUNT)?.wrapping_add(1); 16]);
    assert_eq!(slots.slot_of(last), None);
    Ok(())
}

#[test]
fn test_uninitialized_manager_stops_tracking() -> TestResult {
    let api = MockVendorApi::shared();
    let provider = provider_with(&api)?;
    let slots = DeviceSlotManager::new();
    slots.initialize(&provider);
    assert_eq!(provider.events().subscriber_counts(), (1, 1));

    slots.uninitialize();
    assert!(!slots.is_initialized());
    assert_eq!(provider.events().subscriber_counts(), (0, 0));

    api.attach(SUIT_A);
    provider.poll_now();
    provider.dispatch_pending();
    assert!(slots.connected_slots().is_empty());
    Ok(())
}

#[test]
fn test_dropped_manager_unsubscribes() -> TestResult {
    let api = MockVendorApi::shared();
    let provider = provider_with(&api)?;
    {
        let slots = DeviceSlotManager::new();
        slots.initialize(&provider);
    }
    assert_eq!(provider.events().subscriber_counts(), (0, 0));
    Ok(())
}

#[test]
fn test_missing_enumerate_symbol_skips_tick() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    api.remove_symbol(symbols::GET_DEVICE_LIST);
    let provider = provider_with(&api)?;

    assert_eq!(provider.poll_now(), 0);

    api.restore_symbol(symbols::GET_DEVICE_LIST);
    assert_eq!(provider.poll_now(), 1);
    Ok(())
}

#[test]
fn test_enumeration_status_failure_skips_tick() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    api.fail_status(symbols::GET_DEVICE_LIST, StatusCode::IpcFail);
    let provider = provider_with(&api)?;

    assert_eq!(provider.poll_now(), 0);
    assert!(provider.device_ids().is_empty());
    Ok(())
}

#[test]
fn test_unloaded_library_skips_tick() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    let (loader, _opener) = mock_loader(Arc::clone(&api));
    let provider = DeviceProvider::new(loader, manual_config())?;

    assert_eq!(provider.poll_now(), 0);
    assert_eq!(provider.tick_count(), 1);
    Ok(())
}

#[test]
fn test_drop_closes_live_and_departed_handles() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    api.attach(SUIT_B);
    let provider = provider_with(&api)?;
    provider.poll_now();
    provider.dispatch_pending();
    api.detach(SUIT_B);
    provider.poll_now();
    provider.dispatch_pending();
    assert_eq!(api.open_handle_count(), 2);

    drop(provider);

    assert_eq!(api.open_handle_count(), 0);
    assert_eq!(api.count_calls(|c| matches!(c, ApiCall::CloseDevice(_))), 2);
    Ok(())
}

#[test]
fn test_background_thread_discovers_while_running() -> TestResult {
    let api = MockVendorApi::shared();
    api.attach(SUIT_A);
    let loader = loaded_mock_loader(Arc::clone(&api));
    let provider = DeviceProvider::new(loader, DiscoveryConfig::builder().poll_interval_ms(10).build()?)?;
    let connects = record_connects(&provider);

    assert!(!provider.is_running());
    provider.start();
    let found = wait_until(Duration::from_secs(5), || {
        provider.dispatch_timeout(Duration::from_millis(20));
        !connects.lock().is_empty()
    });
    assert!(found);

    provider.stop();
    assert!(!provider.is_running());
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() {
    let api = MockVendorApi::shared();
    let loader = loaded_mock_loader(api);
    let config = DiscoveryConfig {
        poll_interval_ms: 0,
        device_list_capacity: 8,
    };
    assert!(DeviceProvider::new(loader, config).is_err());
}
