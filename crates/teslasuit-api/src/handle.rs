//! Opaque tokens handed out by the vendor library.
//!
//! Handles are stored as non-zero addresses so they are `Send + Sync`, cheap
//! to copy, and cannot represent the null "no handle" sentinel. Only the
//! native binding turns them back into pointers.

use core::fmt;
use std::ffi::c_void;
use std::num::NonZeroUsize;

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroUsize);

        impl $name {
            /// Build a handle from a raw address; `None` for zero.
            pub fn from_raw(raw: usize) -> Option<Self> {
                NonZeroUsize::new(raw).map(Self)
            }

            /// The raw address.
            pub fn as_raw(self) -> usize {
                self.0.get()
            }

            pub(crate) fn from_ptr(ptr: *mut c_void) -> Option<Self> {
                Self::from_raw(ptr.expose_provenance())
            }

            pub(crate) fn as_ptr(self) -> *mut c_void {
                std::ptr::with_exposed_provenance_mut(self.0.get())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

opaque_handle! {
    /// `TsDeviceHandle*` returned by `ts_device_open`.
    DeviceHandle
}

opaque_handle! {
    /// `TsAsset*` returned by `ts_asset_load_from_binary_data`.
    AssetHandle
}

/// Playable token, meaningful only together with the device that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayableId(pub u64);

impl fmt::Display for PlayableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
