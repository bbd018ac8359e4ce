//! C ABI of the vendor library.
//!
//! Entry points tagged `TS_CALL` in the vendor headers are `__stdcall` on
//! 32-bit Windows and the platform default elsewhere, which is exactly what
//! `extern "system"` selects. Callback typedefs and
//! `ts_haptic_create_playable_from_asset` carry no calling-convention tag and
//! use `extern "C"`.

use std::ffi::{c_int, c_void};

/// Exported symbol names.
pub mod symbols {
    /// `ts_initialize`
    pub const INITIALIZE: &str = "ts_initialize";
    /// `ts_uninitialize`
    pub const UNINITIALIZE: &str = "ts_uninitialize";
    /// `ts_get_device_list`
    pub const GET_DEVICE_LIST: &str = "ts_get_device_list";
    /// `ts_device_open`
    pub const DEVICE_OPEN: &str = "ts_device_open";
    /// `ts_device_close`
    pub const DEVICE_CLOSE: &str = "ts_device_close";
    /// `ts_asset_load_from_binary_data`
    pub const ASSET_LOAD_FROM_BINARY_DATA: &str = "ts_asset_load_from_binary_data";
    /// `ts_asset_unload`
    pub const ASSET_UNLOAD: &str = "ts_asset_unload";
    /// `ts_haptic_create_playable_from_asset`
    pub const HAPTIC_CREATE_PLAYABLE: &str = "ts_haptic_create_playable_from_asset";
    /// `ts_haptic_remove_playable`
    pub const HAPTIC_REMOVE_PLAYABLE: &str = "ts_haptic_remove_playable";
    /// `ts_haptic_clear_all_playables`
    pub const HAPTIC_CLEAR_ALL_PLAYABLES: &str = "ts_haptic_clear_all_playables";
    /// `ts_haptic_play_playable`
    pub const HAPTIC_PLAY_PLAYABLE: &str = "ts_haptic_play_playable";
    /// `ts_haptic_stop_playable`
    pub const HAPTIC_STOP_PLAYABLE: &str = "ts_haptic_stop_playable";
    /// `ts_haptic_stop_player`
    pub const HAPTIC_STOP_PLAYER: &str = "ts_haptic_stop_player";
    /// `ts_mocap_set_skeleton_update_callback`
    pub const MOCAP_SET_SKELETON_CALLBACK: &str = "ts_mocap_set_skeleton_update_callback";
    /// `ts_mocap_start_streaming`
    pub const MOCAP_START_STREAMING: &str = "ts_mocap_start_streaming";
    /// `ts_mocap_stop_streaming`
    pub const MOCAP_STOP_STREAMING: &str = "ts_mocap_stop_streaming";
    /// `ts_mocap_skeleton_calibrate`
    pub const MOCAP_SKELETON_CALIBRATE: &str = "ts_mocap_skeleton_calibrate";
    /// `ts_mocap_skeleton_get_bone`
    pub const MOCAP_SKELETON_GET_BONE: &str = "ts_mocap_skeleton_get_bone";
    /// `ts_ppg_set_update_callback`
    pub const PPG_SET_UPDATE_CALLBACK: &str = "ts_ppg_set_update_callback";
    /// `ts_ppg_start_streaming`
    pub const PPG_START_STREAMING: &str = "ts_ppg_start_streaming";
    /// `ts_ppg_stop_streaming`
    pub const PPG_STOP_STREAMING: &str = "ts_ppg_stop_streaming";
    /// `ts_ppg_calibrate`
    pub const PPG_CALIBRATE: &str = "ts_ppg_calibrate";
    /// `ts_ppg_get_number_of_nodes`
    pub const PPG_GET_NUMBER_OF_NODES: &str = "ts_ppg_get_number_of_nodes";
    /// `ts_ppg_get_node_indexes`
    pub const PPG_GET_NODE_INDEXES: &str = "ts_ppg_get_node_indexes";
    /// `ts_ppg_get_heart_rate`
    pub const PPG_GET_HEART_RATE: &str = "ts_ppg_get_heart_rate";
    /// `ts_ppg_get_oxygen_percent`
    pub const PPG_GET_OXYGEN_PERCENT: &str = "ts_ppg_get_oxygen_percent";
}

/// `TsDevice`: the 16-byte identifier filled in by `ts_get_device_list`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    /// Raw device UUID bytes.
    pub uuid: [u8; 16],
}

impl DeviceDescriptor {
    /// Wrap raw UUID bytes.
    pub const fn new(uuid: [u8; 16]) -> Self {
        Self { uuid }
    }
}

/// `TsVec3f`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3f {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

/// `TsQuat`, stored `w` first as in the vendor header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    /// Scalar part
    pub w: f32,
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// `TsMocapBone`: one bone of a skeleton update in vendor coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MocapBone {
    /// Bone position
    pub position: Vec3f,
    /// Bone rotation
    pub rotation: Quat,
}

pub(crate) type RawHandle = c_void;

pub(crate) type SkeletonCallback =
    unsafe extern "C" fn(dev: *mut RawHandle, skeleton: *const c_void, user_data: *mut c_void);
pub(crate) type PpgCallback =
    unsafe extern "C" fn(dev: *mut RawHandle, ppg_data: *const c_void, user_data: *mut c_void);

pub(crate) type InitializeFn = unsafe extern "system" fn() -> i32;
pub(crate) type UninitializeFn = unsafe extern "system" fn();
pub(crate) type GetDeviceListFn =
    unsafe extern "system" fn(list: *mut DeviceDescriptor, list_size: *mut u32) -> i32;
pub(crate) type DeviceOpenFn =
    unsafe extern "system" fn(device: *const DeviceDescriptor) -> *mut RawHandle;
pub(crate) type DeviceCloseFn = unsafe extern "system" fn(dev: *mut RawHandle);
pub(crate) type AssetLoadFn = unsafe extern "system" fn(data: *const u8, size: u64) -> *mut c_void;
pub(crate) type AssetUnloadFn = unsafe extern "system" fn(asset: *mut c_void);
pub(crate) type CreatePlayableFn = unsafe extern "C" fn(
    dev: *mut RawHandle,
    asset: *mut c_void,
    is_looped: bool,
    playable_id: *mut u64,
) -> i32;
pub(crate) type PlayableFn = unsafe extern "system" fn(dev: *mut RawHandle, playable_id: u64) -> i32;
pub(crate) type DeviceFn = unsafe extern "system" fn(dev: *mut RawHandle) -> i32;
pub(crate) type SetSkeletonCallbackFn = unsafe extern "system" fn(
    dev: *mut RawHandle,
    callback: Option<SkeletonCallback>,
    user_data: *mut c_void,
) -> i32;
pub(crate) type SkeletonGetBoneFn =
    unsafe extern "system" fn(skeleton: *const c_void, index: c_int, bone: *mut MocapBone) -> i32;
pub(crate) type SetPpgCallbackFn = unsafe extern "system" fn(
    dev: *mut RawHandle,
    callback: Option<PpgCallback>,
    user_data: *mut c_void,
) -> i32;
pub(crate) type PpgNodeCountFn = unsafe extern "system" fn(data: *const c_void, count: *mut u8) -> i32;
pub(crate) type PpgNodeIndexesFn =
    unsafe extern "system" fn(data: *const c_void, indexes: *mut u8, count: u8) -> i32;
pub(crate) type PpgHeartRateFn =
    unsafe extern "system" fn(data: *const c_void, node: u8, heart_rate: *mut u32) -> i32;
pub(crate) type PpgOxygenFn =
    unsafe extern "system" fn(data: *const c_void, node: u8, oxygen_percent: *mut u8) -> i32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_match_vendor_header() {
        assert_eq!(std::mem::size_of::<DeviceDescriptor>(), 16);
        assert_eq!(std::mem::size_of::<Vec3f>(), 12);
        assert_eq!(std::mem::size_of::<Quat>(), 16);
        assert_eq!(std::mem::size_of::<MocapBone>(), 28);
    }
}
