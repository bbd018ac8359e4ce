//! Addressable slot indices.

use core::fmt;

use serde::{Deserialize, Serialize};
use teslasuit_errors::ValidationError;

/// Number of device slots.
pub const SLOT_COUNT: usize = 8;

/// One of the [`SLOT_COUNT`] fixed slot positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// The first slot.
    pub const FIRST: Self = Self(0);

    /// Validate a raw slot number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] for numbers `>= SLOT_COUNT`.
    pub fn new(raw: u8) -> Result<Self, ValidationError> {
        if usize::from(raw) < SLOT_COUNT {
            Ok(Self(raw))
        } else {
            Err(ValidationError::out_of_range(
                "slot",
                usize::from(raw),
                0,
                SLOT_COUNT - 1,
            ))
        }
    }

    /// Raw slot number.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Position in a slot array.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every slot in index order.
    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (0..SLOT_COUNT).filter_map(|i| u8::try_from(i).ok()).map(SlotIndex)
    }
}

impl TryFrom<u8> for SlotIndex {
    type Error = ValidationError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<SlotIndex> for u8 {
    fn from(slot: SlotIndex) -> Self {
        slot.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_yields_every_slot() {
        let slots: Vec<u8> = SlotIndex::all().map(SlotIndex::get).collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(SlotIndex::new(7).is_ok());
        assert!(SlotIndex::new(8).is_err());
    }
}
