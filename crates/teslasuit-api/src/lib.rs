//! Runtime-loaded bindings to the Teslasuit vendor library.
//!
//! The vendor library is opened at runtime from the install directory and
//! its entry points are resolved once per load cycle into a [`NativeApi`].
//! Everything above this crate talks to the [`VendorApi`] trait instead, so
//! discovery, haptics and streaming can be exercised against a mock.
//!
//! # Layout
//!
//! - [`LibraryLoader`]: idempotent load/unload, hands out the capability table
//! - [`Core`]: load followed by `ts_initialize`, and the reverse
//! - [`VendorApi`]: one method per vendor entry point the bridge uses
//! - [`ffi`]: `#[repr(C)]` types and exported symbol names

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod ffi;
pub mod handle;
pub mod lifecycle;
pub mod loader;
pub mod native;
pub mod platform;
pub mod ppg;
pub mod skeleton;
pub mod vendor;

pub use config::{INSTALL_DIR_ENV, LoaderConfig};
pub use ffi::{DeviceDescriptor, MocapBone, Quat, Vec3f};
pub use handle::{AssetHandle, DeviceHandle, PlayableId};
pub use lifecycle::Core;
pub use loader::{LibraryLoader, LibraryOpener, LoadOutcome, NativeOpener};
pub use native::NativeApi;
pub use ppg::{PpgFrame, PpgNode};
pub use skeleton::{BoneIndex, SkeletonFrame};
pub use vendor::{PpgSink, SkeletonSink, VendorApi};
