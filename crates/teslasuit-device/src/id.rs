//! Device identity.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use teslasuit_api::DeviceDescriptor;
use teslasuit_errors::ValidationError;

/// 16-byte opaque device identifier.
///
/// Equality and ordering are byte-wise over all 16 bytes. The all-zero value
/// is "unset". Displays as 32 uppercase hex digits without separators.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId([u8; DeviceId::LEN]);

impl DeviceId {
    /// Identifier length in bytes.
    pub const LEN: usize = 16;

    /// The unset identifier.
    pub const UNSET: Self = Self([0; Self::LEN]);

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Build from the first 16 bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidArgument`] when `bytes` is shorter
    /// than 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        bytes
            .get(..Self::LEN)
            .and_then(|head| <[u8; Self::LEN]>::try_from(head).ok())
            .map(Self)
            .ok_or_else(|| {
                ValidationError::invalid(
                    "device_id",
                    format!("need {} bytes, got {}", Self::LEN, bytes.len()),
                )
            })
    }

    /// Raw bytes.
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Whether this is the unset identifier.
    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({self})")
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::invalid("device_id", format!("not 32 hex digits: {s:?}"));
        if s.len() != Self::LEN * 2 {
            return Err(invalid());
        }
        let nibble = |c: u8| char::from(c).to_digit(16).and_then(|d| u8::try_from(d).ok());
        let mut bytes = [0_u8; Self::LEN];
        for (byte, pair) in bytes.iter_mut().zip(s.as_bytes().chunks_exact(2)) {
            let (hi, lo) = match pair {
                [hi, lo] => (nibble(*hi), nibble(*lo)),
                _ => (None, None),
            };
            *byte = hi.zip(lo).map(|(hi, lo)| (hi << 4) | lo).ok_or_else(invalid)?;
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; DeviceId::LEN]> for DeviceId {
    fn from(bytes: [u8; DeviceId::LEN]) -> Self {
        Self(bytes)
    }
}

impl From<DeviceDescriptor> for DeviceId {
    fn from(descriptor: DeviceDescriptor) -> Self {
        Self(descriptor.uuid)
    }
}

impl From<&DeviceDescriptor> for DeviceId {
    fn from(descriptor: &DeviceDescriptor) -> Self {
        Self(descriptor.uuid)
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        assert!(DeviceId::default().is_unset());
        assert!(!DeviceId::from_bytes([1; 16]).is_unset());
    }

    #[test]
    fn test_short_slice_is_rejected() {
        let result = DeviceId::from_slice(&[0xAB; 15]);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidArgument { .. })
        ));
        assert!(DeviceId::from_slice(&[]).is_err());
    }

    #[test]
    fn test_long_slice_uses_prefix() -> Result<(), ValidationError> {
        let mut bytes = [7_u8; 20];
        bytes[16] = 0xFF;
        assert_eq!(DeviceId::from_slice(&bytes)?, DeviceId::from_bytes([7; 16]));
        Ok(())
    }

    #[test]
    fn test_display_is_uppercase_hex() {
        let mut bytes = [0_u8; 16];
        bytes[0] = 0xAB;
        bytes[15] = 0x0C;
        let id = DeviceId::from_bytes(bytes);
        assert_eq!(id.to_string(), "AB00000000000000000000000000000C");
        assert_eq!(id.to_string().len(), 32);
    }

    #[test]
    fn test_parse_accepts_lowercase() -> Result<(), ValidationError> {
        let id: DeviceId = "ab00000000000000000000000000000c".parse()?;
        assert_eq!(id.as_bytes()[0], 0xAB);
        assert!("AB".parse::<DeviceId>().is_err());
        assert!("zz000000000000000000000000000000".parse::<DeviceId>().is_err());
        Ok(())
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let low = DeviceId::from_bytes([0, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let high = DeviceId::from_bytes([1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(low < high);
    }
}
