//! Motion-capture skeleton streaming.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use teslasuit_api::{BoneIndex, DeviceHandle, LibraryLoader, SkeletonFrame, SkeletonSink, VendorApi};
use teslasuit_errors::{ApiError, TeslasuitError, ValidationError};
use tracing::{debug, error, info};

use crate::guard::Guarded;
use crate::transform::{BoneTransform, TRACKED_BONES};

/// Host-space pose of every tracked bone.
pub type MocapSnapshot = BTreeMap<BoneIndex, BoneTransform>;

#[derive(Debug)]
struct MocapData {
    bones: MocapSnapshot,
    frames: u64,
}

type Shared = Mutex<Guarded<MocapData>>;

struct MocapSink {
    state: Weak<Shared>,
}

impl SkeletonSink for MocapSink {
    fn on_skeleton(&self, device: DeviceHandle, frame: &SkeletonFrame) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock();
        if !state.accepts(device) {
            return;
        }
        for index in TRACKED_BONES {
            if let Some(bone) = frame.bone(index) {
                state.data.bones.insert(index, BoneTransform::from_vendor(bone));
            }
        }
        state.data.frames += 1;
    }
}

/// Streams skeleton updates from one device into a locked bone map.
///
/// The capability table is captured at construction and used for the
/// lifetime of the stream. Dropping a running stream stops it.
pub struct MocapStream {
    api: Arc<dyn VendorApi>,
    state: Arc<Shared>,
    // Serializes set_device, start and stop end to end.
    control: Mutex<()>,
}

impl MocapStream {
    /// Create a stopped stream with every tracked bone at identity.
    pub fn new(api: Arc<dyn VendorApi>) -> Self {
        let bones = TRACKED_BONES
            .iter()
            .map(|index| (*index, BoneTransform::IDENTITY))
            .collect();
        debug!("Mocap stream created");
        Self {
            api,
            state: Arc::new(Mutex::new(Guarded::new(MocapData { bones, frames: 0 }))),
            control: Mutex::new(()),
        }
    }

    /// Create a stream on the loader's current capability table.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotLoaded`] if the library is not loaded.
    pub fn from_loader(loader: &LibraryLoader) -> Result<Self, ApiError> {
        Ok(Self::new(loader.require()?))
    }

    /// Switch to `device`, stopping any previous stream, and start
    /// streaming.
    ///
    /// # Errors
    ///
    /// The vendor error if the callback cannot be installed or streaming
    /// cannot start.
    pub fn set_device(&self, device: DeviceHandle) -> Result<(), TeslasuitError> {
        let _control = self.control.lock();
        let previous = self.state.lock().attach(device);
        if let Some(previous) = previous
            && self.release(previous).is_err()
        {
            debug!(device = %previous, "Previous mocap stream did not stop cleanly");
        }
        self.start_locked()
    }

    /// Install the skeleton callback and start streaming on the attached
    /// device. A no-op while already running.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Required`] without an attached device, or the
    /// vendor error; the stream stays stopped on failure.
    pub fn start(&self) -> Result<(), TeslasuitError> {
        let _control = self.control.lock();
        self.start_locked()
    }

    fn start_locked(&self) -> Result<(), TeslasuitError> {
        let device = {
            let mut state = self.state.lock();
            if state.is_running() {
                return Ok(());
            }
            state.resume().ok_or_else(|| ValidationError::required("device"))?
        };

        let sink: Arc<dyn SkeletonSink> = Arc::new(MocapSink {
            state: Arc::downgrade(&self.state),
        });
        let started = self
            .api
            .set_skeleton_sink(device, Some(sink))
            .and_then(|()| self.api.mocap_start_streaming(device));
        if let Err(err) = started {
            error!(device = %device, error = %err, "Failed to start mocap streaming");
            self.state.lock().halt();
            return Err(err.into());
        }
        info!(device = %device, "Mocap streaming started");
        Ok(())
    }

    /// Stop streaming and remove the callback. A no-op while stopped.
    ///
    /// # Errors
    ///
    /// The vendor error of the first failing call.
    pub fn stop(&self) -> Result<(), TeslasuitError> {
        let _control = self.control.lock();
        let Some(device) = self.state.lock().halt() else {
            return Ok(());
        };
        self.release(device)?;
        info!(device = %device, "Mocap streaming stopped");
        Ok(())
    }

    // Runs without the state lock so an in-flight callback can finish.
    fn release(&self, device: DeviceHandle) -> Result<(), ApiError> {
        let cleared = self.api.set_skeleton_sink(device, None);
        let stopped = self.api.mocap_stop_streaming(device);
        cleared.and(stopped).inspect_err(|err| {
            error!(device = %device, error = %err, "Failed to stop mocap streaming");
        })
    }

    /// Calibrate the skeleton of the attached device.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Required`] without an attached device, or the
    /// vendor error.
    pub fn calibrate(&self) -> Result<(), TeslasuitError> {
        let device = self
            .state
            .lock()
            .device()
            .ok_or_else(|| ValidationError::required("device"))?;
        self.api.mocap_calibrate(device).inspect_err(|err| {
            error!(device = %device, error = %err, "Failed to calibrate skeleton");
        })?;
        info!(device = %device, "Skeleton calibrated");
        Ok(())
    }

    /// Whether streaming is on.
    pub fn is_running(&self) -> bool {
        self.state.lock().is_running()
    }

    /// Attached device.
    pub fn device(&self) -> Option<DeviceHandle> {
        self.state.lock().device()
    }

    /// Copy of every tracked bone.
    pub fn snapshot(&self) -> MocapSnapshot {
        self.state.lock().data.bones.clone()
    }

    /// One tracked bone.
    pub fn bone(&self, index: BoneIndex) -> Option<BoneTransform> {
        self.state.lock().data.bones.get(&index).copied()
    }

    /// Number of skeleton updates applied.
    pub fn frame_count(&self) -> u64 {
        self.state.lock().data.frames
    }
}

impl Drop for MocapStream {
    fn drop(&mut self) {
        if self.stop().is_err() {
            debug!("Mocap stream dropped while streaming could not be stopped");
        }
    }
}

impl std::fmt::Debug for MocapStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MocapStream")
            .field("device", &state.device())
            .field("running", &state.is_running())
            .field("frames", &state.data.frames)
            .finish_non_exhaustive()
    }
}
