//! Device discovery and slot bookkeeping errors.

use crate::common::ErrorSeverity;

/// Device discovery and slot errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device is already bound to a connected slot.
    #[error("Device {device} is already connected in slot {slot}")]
    AlreadyConnected {
        /// Slot holding the device
        slot: u8,
        /// Device identifier
        device: String,
    },

    /// Every slot is occupied by a connected device.
    #[error("No free slot for device {device}: all {capacity} slots are connected")]
    CapacityExceeded {
        /// Device identifier
        device: String,
        /// Number of slots
        capacity: usize,
    },

    /// The device is not known to the slot table or the provider.
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// The vendor library could not open the device.
    #[error("Failed to open device {device}: {reason}")]
    OpenFailed {
        /// Device identifier
        device: String,
        /// Failure reason
        reason: String,
    },

    /// The background poller thread could not be spawned.
    #[error("Failed to spawn discovery thread: {0}")]
    ThreadSpawn(String),
}

impl DeviceError {
    /// Get the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeviceError::AlreadyConnected { .. } => ErrorSeverity::Warning,
            DeviceError::CapacityExceeded { .. } => ErrorSeverity::Warning,
            DeviceError::UnknownDevice(_) => ErrorSeverity::Warning,
            DeviceError::OpenFailed { .. } => ErrorSeverity::Error,
            DeviceError::ThreadSpawn(_) => ErrorSeverity::Critical,
        }
    }

    /// Create an unknown device error.
    pub fn unknown(device: impl Into<String>) -> Self {
        DeviceError::UnknownDevice(device.into())
    }

    /// Create an open failure error.
    pub fn open_failed(device: impl Into<String>, reason: impl Into<String>) -> Self {
        DeviceError::OpenFailed {
            device: device.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = DeviceError::CapacityExceeded {
            device: "0A0B".into(),
            capacity: 8,
        };
        assert!(err.to_string().contains("all 8 slots"));
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_thread_spawn_is_critical() {
        assert_eq!(
            DeviceError::ThreadSpawn("EAGAIN".into()).severity(),
            ErrorSeverity::Critical
        );
    }
}
