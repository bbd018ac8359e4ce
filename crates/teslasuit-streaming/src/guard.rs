//! Device/running guard shared by the streaming adapters.
//!
//! The vendor callback thread and the public accessors take the same lock,
//! and the callback only writes while the guard says the frame belongs to
//! the attached device of a running stream.

use teslasuit_api::DeviceHandle;

#[derive(Debug)]
pub(crate) struct Guarded<D> {
    device: Option<DeviceHandle>,
    running: bool,
    pub(crate) data: D,
}

impl<D> Guarded<D> {
    pub(crate) fn new(data: D) -> Self {
        Self {
            device: None,
            running: false,
            data,
        }
    }

    pub(crate) fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a frame from `device` may be written.
    pub(crate) fn accepts(&self, device: DeviceHandle) -> bool {
        self.running && self.device == Some(device)
    }

    /// Attach `device`, returning the previous device if it was streaming.
    pub(crate) fn attach(&mut self, device: DeviceHandle) -> Option<DeviceHandle> {
        let previous = self.halt();
        self.device = Some(device);
        previous
    }

    /// Mark the stream running on the attached device.
    pub(crate) fn resume(&mut self) -> Option<DeviceHandle> {
        let device = self.device?;
        self.running = true;
        Some(device)
    }

    /// Mark the stream stopped, returning the device if it was running.
    pub(crate) fn halt(&mut self) -> Option<DeviceHandle> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.device
    }
}
