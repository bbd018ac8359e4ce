//! Photoplethysmography streaming.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use teslasuit_api::{DeviceHandle, LibraryLoader, PpgFrame, PpgSink, VendorApi};
use teslasuit_errors::{ApiError, TeslasuitError, ValidationError};
use tracing::{debug, error, info};

use crate::guard::Guarded;

/// Latest reading of the first reporting PPG node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PpgSample {
    /// Vendor node index the reading came from
    pub node: u8,
    /// Heart rate in beats per minute
    pub heart_rate: u32,
    /// Blood oxygen saturation in percent
    pub oxygen_percent: u8,
}

type Shared = Mutex<Guarded<Option<PpgSample>>>;

struct PpgStreamSink {
    state: Weak<Shared>,
}

impl PpgSink for PpgStreamSink {
    fn on_ppg(&self, device: DeviceHandle, frame: &PpgFrame) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock();
        if !state.accepts(device) {
            return;
        }
        // Frames without nodes keep the previous reading.
        if let Some(node) = frame.first() {
            state.data = Some(PpgSample {
                node: node.index,
                heart_rate: node.heart_rate,
                oxygen_percent: node.oxygen_percent,
            });
        }
    }
}

/// Streams PPG updates from one device, keeping the latest reading.
pub struct PpgStream {
    api: Arc<dyn VendorApi>,
    state: Arc<Shared>,
    // Serializes set_device, start and stop end to end.
    control: Mutex<()>,
}

impl PpgStream {
    /// Create a stopped stream.
    pub fn new(api: Arc<dyn VendorApi>) -> Self {
        debug!("PPG stream created");
        Self {
            api,
            state: Arc::new(Mutex::new(Guarded::new(None))),
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
        let previous = {
            let mut state = self.state.lock();
            let previous = state.attach(device);
            state.data = None;
            previous
        };
        if let Some(previous) = previous
            && self.release(previous).is_err()
        {
            debug!(device = %previous, "Previous PPG stream did not stop cleanly");
        }
        self.start_locked()
    }

    /// Install the PPG callback and start streaming on the attached device.
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

        let sink: Arc<dyn PpgSink> = Arc::new(PpgStreamSink {
            state: Arc::downgrade(&self.state),
        });
        let started = self
            .api
            .set_ppg_sink(device, Some(sink))
            .and_then(|()| self.api.ppg_start_streaming(device));
        if let Err(err) = started {
            error!(device = %device, error = %err, "Failed to start PPG streaming");
            self.state.lock().halt();
            return Err(err.into());
        }
        info!(device = %device, "PPG streaming started");
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
        info!(device = %device, "PPG streaming stopped");
        Ok(())
    }

    fn release(&self, device: DeviceHandle) -> Result<(), ApiError> {
        let cleared = self.api.set_ppg_sink(device, None);
        let stopped = self.api.ppg_stop_streaming(device);
        cleared.and(stopped).inspect_err(|err| {
            error!(device = %device, error = %err, "Failed to stop PPG streaming");
        })
    }

    /// Calibrate the PPG sensors of the attached device.
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
        self.api.ppg_calibrate(device).inspect_err(|err| {
            error!(device = %device, error = %err, "Failed to calibrate PPG");
        })?;
        info!(device = %device, "PPG calibrated");
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

    /// Latest reading, `None` until the first node reports.
    pub fn snapshot(&self) -> Option<PpgSample> {
        self.state.lock().data
    }
}

impl Drop for PpgStream {
    fn drop(&mut self) {
        if self.stop().is_err() {
            debug!("PPG stream dropped while streaming could not be stopped");
        }
    }
}

impl std::fmt::Debug for PpgStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PpgStream")
            .field("device", &state.device())
            .field("running", &state.is_running())
            .field("sample", &state.data)
            .finish_non_exhaustive()
    }
}
