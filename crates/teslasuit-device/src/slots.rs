//! Device slot manager.
//!
//! Maps device identities onto a fixed table of [`SLOT_COUNT`] slots and
//! republishes provider connect/disconnect events as slot events.
//!
//! Slot bindings are sticky: a device remembers the slot it last occupied
//! and gets it back on reconnect as long as nobody else took it meanwhile.
//! A new device prefers slots nobody remembers, and only evicts a stale
//! memory when every free slot is remembered by an absent device.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use teslasuit_api::DeviceHandle;
use teslasuit_errors::DeviceError;
use tracing::{debug, error, info, warn};

use crate::id::DeviceId;
use crate::provider::{DeviceProvider, ProviderEvents};
use crate::record::DeviceRecord;
use crate::registry::{CallbackRegistry, SubscriberId};
use crate::slot::{SLOT_COUNT, SlotIndex};

/// Slot-level notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    /// A device became connected at the slot.
    Connected(SlotIndex),
    /// The device at the slot is about to be marked disconnected.
    Disconnected(SlotIndex),
}

impl SlotEvent {
    /// The slot the event refers to.
    pub fn slot(self) -> SlotIndex {
        match self {
            SlotEvent::Connected(slot) | SlotEvent::Disconnected(slot) => slot,
        }
    }
}

/// Callback receiving [`SlotEvent`]s.
pub type SlotCallback = dyn Fn(SlotEvent) + Send + Sync;

/// Slot records plus remembered identity bindings.
///
/// Invariants: an identity occupies at most one connected slot, and no two
/// identities remember the same slot.
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    records: [DeviceRecord; SLOT_COUNT],
    bindings: HashMap<DeviceId, SlotIndex>,
}

impl SlotTable {
    /// An empty table with every record inert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `id` to a slot and mark it connected.
    ///
    /// # Errors
    ///
    /// [`DeviceError::AlreadyConnected`] if `id` already occupies a slot,
    /// [`DeviceError::CapacityExceeded`] if every slot is connected. Neither
    /// changes the table.
    pub fn connect(&mut self, id: DeviceId, handle: DeviceHandle) -> Result<SlotIndex, DeviceError> {
        if let Some(slot) = self.slot_of(id) {
            return Err(DeviceError::AlreadyConnected {
                slot: slot.get(),
                device: id.to_string(),
            });
        }
        let slot = self.choose_slot(id).ok_or_else(|| DeviceError::CapacityExceeded {
            device: id.to_string(),
            capacity: SLOT_COUNT,
        })?;

        self.bindings.retain(|other, bound| *other == id || *bound != slot);
        self.bindings.insert(id, slot);
        if let Some(record) = self.records.get_mut(slot.index()) {
            record.connect(id, handle);
        }
        Ok(slot)
    }

    /// Mark the slot holding `id` disconnected, keeping the binding.
    /// Returns `None` if `id` is not connected.
    pub fn disconnect(&mut self, id: DeviceId) -> Option<SlotIndex> {
        let slot = self.slot_of(id)?;
        if let Some(record) = self.records.get_mut(slot.index()) {
            record.disconnect();
        }
        Some(slot)
    }

    /// Slot currently connected to `id`.
    pub fn slot_of(&self, id: DeviceId) -> Option<SlotIndex> {
        SlotIndex::all().find(|slot| {
            self.records
                .get(slot.index())
                .is_some_and(|r| r.is_connected() && r.id() == id)
        })
    }

    /// Slot `id` would prefer on its next connect, connected or not.
    pub fn remembered_slot(&self, id: DeviceId) -> Option<SlotIndex> {
        self.bindings.get(&id).copied()
    }

    /// Snapshot of one slot's record.
    pub fn record(&self, slot: SlotIndex) -> DeviceRecord {
        self.records.get(slot.index()).copied().unwrap_or_default()
    }

    /// Connected slots in index order.
    pub fn connected_slots(&self) -> Vec<SlotIndex> {
        SlotIndex::all().filter(|slot| !self.is_free(*slot)).collect()
    }

    fn is_free(&self, slot: SlotIndex) -> bool {
        self.records
            .get(slot.index())
            .is_some_and(|r| !r.is_connected())
    }

    fn choose_slot(&self, id: DeviceId) -> Option<SlotIndex> {
        if let Some(&slot) = self.bindings.get(&id)
            && self.is_free(slot)
        {
            return Some(slot);
        }
        let remembered: HashSet<SlotIndex> = self
            .bindings
            .iter()
            .filter(|(other, _)| **other != id)
            .map(|(_, slot)| *slot)
            .collect();
        SlotIndex::all()
            .find(|slot| self.is_free(*slot) && !remembered.contains(slot))
            .or_else(|| SlotIndex::all().find(|slot| self.is_free(*slot)))
    }
}

struct SlotState {
    table: Mutex<SlotTable>,
    listeners: CallbackRegistry<SlotCallback>,
}

impl SlotState {
    fn connect(&self, id: DeviceId, handle: DeviceHandle) -> Result<SlotIndex, DeviceError> {
        let slot = self.table.lock().connect(id, handle)?;
        info!(device_id = %id, slot = %slot, "Device bound to slot");
        self.listeners.for_each(|cb| cb(SlotEvent::Connected(slot)));
        Ok(slot)
    }

    fn disconnect(&self, id: DeviceId) -> Option<SlotIndex> {
        let Some(slot) = self.table.lock().slot_of(id) else {
            debug!(device_id = %id, "Disconnect for device without a slot ignored");
            return None;
        };
        // Listeners still see the record as connected.
        self.listeners.for_each(|cb| cb(SlotEvent::Disconnected(slot)));
        self.table.lock().disconnect(id);
        info!(device_id = %id, slot = %slot, "Device left slot");
        Some(slot)
    }
}

/// Fixed table of device slots fed by a [`DeviceProvider`].
pub struct DeviceSlotManager {
    key: SubscriberId,
    state: Arc<SlotState>,
    link: Mutex<Option<ProviderEvents>>,
}

impl Default for DeviceSlotManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSlotManager {
    /// A manager with every slot inert, not yet attached to a provider.
    pub fn new() -> Self {
        Self {
            key: SubscriberId::unique(),
            state: Arc::new(SlotState {
                table: Mutex::new(SlotTable::new()),
                listeners: CallbackRegistry::new(),
            }),
            link: Mutex::new(None),
        }
    }

    /// Subscribe to `provider` and replay the devices it already holds.
    ///
    /// Calling this again re-subscribes; devices already in a slot are
    /// skipped during replay.
    pub fn initialize(&self, provider: &DeviceProvider) {
        let events = provider.events().clone();

        let weak: Weak<SlotState> = Arc::downgrade(&self.state);
        events.subscribe_on_connect(self.key, move |id, handle| {
            if let Some(state) = weak.upgrade()
                && let Err(err) = state.connect(id, handle)
            {
                error!(device_id = %id, error = %err, "Failed to bind device to a slot");
            }
        });
        let weak: Weak<SlotState> = Arc::downgrade(&self.state);
        events.subscribe_on_disconnect(self.key, move |id| {
            if let Some(state) = weak.upgrade() {
                state.disconnect(id);
            }
        });
        *self.link.lock() = Some(events);

        let mut replayed = 0;
        for (id, handle) in provider.connected_devices() {
            match self.state.connect(id, handle) {
                Ok(_) => replayed += 1,
                Err(DeviceError::AlreadyConnected { .. }) => {}
                Err(err) => error!(device_id = %id, error = %err, "Failed to bind device to a slot"),
            }
        }
        info!(replayed, "Slot manager initialized");
    }

    /// Unsubscribe from the provider. Bound devices stay bound.
    pub fn uninitialize(&self) {
        if let Some(events) = self.link.lock().take() {
            events.unsubscribe_on_connect(self.key);
            events.unsubscribe_on_disconnect(self.key);
            debug!("Slot manager unsubscribed from provider");
        }
    }

    /// Whether the manager is subscribed to a provider.
    pub fn is_initialized(&self) -> bool {
        self.link.lock().is_some()
    }

    /// Bind a device directly, bypassing the provider.
    ///
    /// # Errors
    ///
    /// See [`SlotTable::connect`].
    pub fn connect(&self, id: DeviceId, handle: DeviceHandle) -> Result<SlotIndex, DeviceError> {
        self.state.connect(id, handle).inspect_err(|err| {
            warn!(device_id = %id, error = %err, "Slot connect rejected");
        })
    }

    /// Release the slot held by `id`, broadcasting first.
    pub fn disconnect(&self, id: DeviceId) -> Option<SlotIndex> {
        self.state.disconnect(id)
    }

    /// Snapshot of the record at `slot`.
    pub fn device(&self, slot: SlotIndex) -> DeviceRecord {
        self.state.table.lock().record(slot)
    }

    /// Handle of the device connected at `slot`.
    pub fn device_handle(&self, slot: SlotIndex) -> Option<DeviceHandle> {
        self.device(slot).handle()
    }

    /// Slot connected to `id`.
    pub fn slot_of(&self, id: DeviceId) -> Option<SlotIndex> {
        self.state.table.lock().slot_of(id)
    }

    /// Slot `id` would get back on reconnect.
    pub fn remembered_slot(&self, id: DeviceId) -> Option<SlotIndex> {
        self.state.table.lock().remembered_slot(id)
    }

    /// Connected slots in index order.
    pub fn connected_slots(&self) -> Vec<SlotIndex> {
        self.state.table.lock().connected_slots()
    }

    /// Register a slot event callback under `key`.
    pub fn subscribe(&self, key: SubscriberId, callback: impl Fn(SlotEvent) + Send + Sync + 'static) {
        self.state.listeners.subscribe(key, Arc::new(callback));
    }

    /// Remove the slot event callback held by `key`.
    pub fn unsubscribe(&self, key: SubscriberId) -> bool {
        self.state.listeners.unsubscribe(key)
    }
}

impl Drop for DeviceSlotManager {
    fn drop(&mut self) {
        self.uninitialize();
    }
}

impl std::fmt::Debug for DeviceSlotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSlotManager")
            .field("key", &self.key)
            .field("connected_slots", &self.connected_slots())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
