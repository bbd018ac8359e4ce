//! Haptic asset and playable errors.

use crate::common::ErrorSeverity;

/// Errors raised by the haptic asset manager and player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HapticError {
    /// The player has no device attached.
    #[error("No device attached to the haptic player")]
    NoDevice,

    /// A playlist index is out of range.
    #[error("Playlist index {index} out of range (playlist has {len} entries)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Playlist length
        len: usize,
    },

    /// The playlist entry has no playable for the current device.
    #[error("Playlist entry {0} has no playable on the current device")]
    NoPlayable(usize),

    /// The asset file could not be read.
    #[error("Failed to read haptic asset {path}: {reason}")]
    AssetRead {
        /// Asset path
        path: String,
        /// Failure reason
        reason: String,
    },
}

impl HapticError {
    /// Get the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HapticError::NoDevice => ErrorSeverity::Warning,
            HapticError::IndexOutOfRange { .. } => ErrorSeverity::Warning,
            HapticError::NoPlayable(_) => ErrorSeverity::Warning,
            HapticError::AssetRead { .. } => ErrorSeverity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_out_of_range_message() {
        let err = HapticError::IndexOutOfRange { index: 4, len: 2 };
        assert!(err.to_string().contains("index 4"));
        assert!(err.to_string().contains("2 entries"));
    }
}
