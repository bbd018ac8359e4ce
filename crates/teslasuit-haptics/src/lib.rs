//! Haptic playback for Teslasuit devices.
//!
//! [`HapticAssetManager`] owns the vendor handles of loaded assets and the
//! set of devices that hold playables; [`HapticPlayer`] drives a playlist on
//! one device through it.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod asset;
pub mod manager;
pub mod player;

pub use asset::{ASSET_EXTENSION, AssetId, HapticAsset};
pub use manager::HapticAssetManager;
pub use player::HapticPlayer;
