//! Per-slot device state.

use teslasuit_api::DeviceHandle;

use crate::id::DeviceId;

/// The device occupying one slot.
///
/// Starts inert (unset identity, no handle, disconnected); `connect` and
/// `disconnect` move it between the two states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    id: DeviceId,
    handle: Option<DeviceHandle>,
    connected: bool,
}

impl DeviceRecord {
    /// Bind the record to a connected device.
    pub fn connect(&mut self, id: DeviceId, handle: DeviceHandle) {
        self.id = id;
        self.handle = Some(handle);
        self.connected = true;
    }

    /// Reset to the inert state.
    pub fn disconnect(&mut self) {
        *self = Self::default();
    }

    /// Identity of the bound device; unset when disconnected.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Native handle of the bound device.
    pub fn handle(&self) -> Option<DeviceHandle> {
        self.handle
    }

    /// Whether a device is bound.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}
