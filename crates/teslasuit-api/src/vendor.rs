//! The capability port every other crate programs against.

use std::sync::Arc;

use teslasuit_errors::ApiResult;

use crate::ffi::DeviceDescriptor;
use crate::handle::{AssetHandle, DeviceHandle, PlayableId};
use crate::ppg::PpgFrame;
use crate::skeleton::SkeletonFrame;

/// Receiver of motion-capture skeleton updates.
///
/// Called on a thread owned by the vendor library, never concurrently with
/// itself for the same device.
pub trait SkeletonSink: Send + Sync {
    /// A skeleton update arrived for `device`.
    fn on_skeleton(&self, device: DeviceHandle, frame: &SkeletonFrame);
}

/// Receiver of PPG updates. Same threading rules as [`SkeletonSink`].
pub trait PpgSink: Send + Sync {
    /// A PPG update arrived for `device`.
    fn on_ppg(&self, device: DeviceHandle, frame: &PpgFrame);
}

/// Resolved entry points of one load cycle of the vendor library.
///
/// An implementation stays valid for as long as it is referenced, even after
/// the loader that produced it unloads: the library is only unmapped when the
/// last reference drops. Every method fails with
/// [`ApiError::SymbolUnavailable`](teslasuit_errors::ApiError::SymbolUnavailable)
/// when the library does not export the entry point it needs.
pub trait VendorApi: Send + Sync {
    /// `ts_initialize`
    fn initialize(&self) -> ApiResult;

    /// `ts_uninitialize`
    fn uninitialize(&self) -> ApiResult;

    /// `ts_get_device_list`: fill `buffer` and return how many entries are valid.
    fn enumerate_devices(&self, buffer: &mut [DeviceDescriptor]) -> ApiResult<usize>;

    /// `ts_device_open`
    fn open_device(&self, descriptor: &DeviceDescriptor) -> ApiResult<DeviceHandle>;

    /// `ts_device_close`
    fn close_device(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_asset_load_from_binary_data`
    fn load_asset(&self, data: &[u8]) -> ApiResult<AssetHandle>;

    /// `ts_asset_unload`
    fn unload_asset(&self, asset: AssetHandle) -> ApiResult;

    /// `ts_haptic_create_playable_from_asset`
    fn create_playable(
        &self,
        device: DeviceHandle,
        asset: AssetHandle,
        looped: bool,
    ) -> ApiResult<PlayableId>;

    /// `ts_haptic_remove_playable`
    fn remove_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult;

    /// `ts_haptic_clear_all_playables`
    fn clear_all_playables(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_haptic_play_playable`
    fn play_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult;

    /// `ts_haptic_stop_playable`
    fn stop_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult;

    /// `ts_haptic_stop_player`
    fn stop_player(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_mocap_set_skeleton_update_callback`; `None` clears the callback.
    fn set_skeleton_sink(
        &self,
        device: DeviceHandle,
        sink: Option<Arc<dyn SkeletonSink>>,
    ) -> ApiResult;

    /// `ts_mocap_start_streaming`
    fn mocap_start_streaming(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_mocap_stop_streaming`
    fn mocap_stop_streaming(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_mocap_skeleton_calibrate`
    fn mocap_calibrate(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_ppg_set_update_callback`; `None` clears the callback.
    fn set_ppg_sink(&self, device: DeviceHandle, sink: Option<Arc<dyn PpgSink>>) -> ApiResult;

    /// `ts_ppg_start_streaming`
    fn ppg_start_streaming(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_ppg_stop_streaming`
    fn ppg_stop_streaming(&self, device: DeviceHandle) -> ApiResult;

    /// `ts_ppg_calibrate`
    fn ppg_calibrate(&self, device: DeviceHandle) -> ApiResult;
}
