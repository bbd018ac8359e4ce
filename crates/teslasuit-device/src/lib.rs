//! Teslasuit device discovery and slot management.
//!
//! [`DeviceProvider`] polls the vendor library for attached suits on a
//! background thread and hands connect/disconnect events to a consumer
//! thread. [`DeviceSlotManager`] maps the identities it reports onto a
//! fixed table of [`SLOT_COUNT`] slots.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod id;
pub mod provider;
pub mod record;
pub mod registry;
pub mod slot;
pub mod slots;

pub use config::{DiscoveryConfig, DiscoveryConfigBuilder};
pub use id::DeviceId;
pub use provider::{ConnectCallback, DeviceProvider, DisconnectCallback, ProviderEvents};
pub use record::DeviceRecord;
pub use registry::{CallbackRegistry, SubscriberId};
pub use slot::{SLOT_COUNT, SlotIndex};
pub use slots::{DeviceSlotManager, SlotCallback, SlotEvent, SlotTable};
