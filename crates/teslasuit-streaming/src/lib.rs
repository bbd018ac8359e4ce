//! Motion-capture and PPG streaming adapters.
//!
//! Each adapter captures the vendor capability table once, installs a
//! callback on the attached device and keeps the latest data behind a
//! single mutex that both the vendor callback thread and readers take.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

mod guard;
pub mod mocap;
pub mod ppg;
pub mod transform;

pub use mocap::{MocapSnapshot, MocapStream};
pub use ppg::{PpgSample, PpgStream};
pub use transform::{BoneTransform, TRACKED_BONES};
