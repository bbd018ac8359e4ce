//! [`VendorApi`] backed by the real vendor library.

use std::collections::HashMap;
use std::ffi::{c_int, c_void};
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;
use teslasuit_errors::{ApiError, ApiResult, StatusCode};

use crate::ffi::{
    self, AssetLoadFn, AssetUnloadFn, CreatePlayableFn, DeviceCloseFn, DeviceDescriptor,
    DeviceFn, DeviceOpenFn, GetDeviceListFn, InitializeFn, MocapBone, PlayableFn,
    PpgHeartRateFn, PpgNodeCountFn, PpgNodeIndexesFn, PpgOxygenFn, RawHandle,
    SetPpgCallbackFn, SetSkeletonCallbackFn, SkeletonGetBoneFn, UninitializeFn, symbols,
};
use crate::handle::{AssetHandle, DeviceHandle, PlayableId};
use crate::ppg::{PpgFrame, PpgNode};
use crate::skeleton::{BoneIndex, SkeletonFrame};
use crate::vendor::{PpgSink, SkeletonSink, VendorApi};

/// Resolve one symbol, logging and yielding `None` when it is not exported.
macro_rules! resolve {
    ($library:expr, $name:expr) => {{
        // SAFETY: every field of `SymbolTable` is declared with the signature
        // the vendor header gives for the symbol it is resolved from.
        match unsafe { $library.get($name.as_bytes()) } {
            Ok(symbol) => Some(*symbol),
            Err(err) => {
                tracing::debug!(symbol = $name, error = %err, "Vendor symbol not exported");
                None
            }
        }
    }};
}

#[derive(Clone, Copy)]
struct SymbolTable {
    initialize: Option<InitializeFn>,
    uninitialize: Option<UninitializeFn>,
    get_device_list: Option<GetDeviceListFn>,
    device_open: Option<DeviceOpenFn>,
    device_close: Option<DeviceCloseFn>,
    asset_load: Option<AssetLoadFn>,
    asset_unload: Option<AssetUnloadFn>,
    create_playable: Option<CreatePlayableFn>,
    remove_playable: Option<PlayableFn>,
    clear_all_playables: Option<DeviceFn>,
    play_playable: Option<PlayableFn>,
    stop_playable: Option<PlayableFn>,
    stop_player: Option<DeviceFn>,
    mocap_set_callback: Option<SetSkeletonCallbackFn>,
    mocap_start: Option<DeviceFn>,
    mocap_stop: Option<DeviceFn>,
    mocap_calibrate: Option<DeviceFn>,
    mocap_get_bone: Option<SkeletonGetBoneFn>,
    ppg_set_callback: Option<SetPpgCallbackFn>,
    ppg_start: Option<DeviceFn>,
    ppg_stop: Option<DeviceFn>,
    ppg_calibrate: Option<DeviceFn>,
    ppg_node_count: Option<PpgNodeCountFn>,
    ppg_node_indexes: Option<PpgNodeIndexesFn>,
    ppg_heart_rate: Option<PpgHeartRateFn>,
    ppg_oxygen: Option<PpgOxygenFn>,
}

impl SymbolTable {
    fn resolve(library: &Library) -> Self {
        Self {
            initialize: resolve!(library, symbols::INITIALIZE),
            uninitialize: resolve!(library, symbols::UNINITIALIZE),
            get_device_list: resolve!(library, symbols::GET_DEVICE_LIST),
            device_open: resolve!(library, symbols::DEVICE_OPEN),
            device_close: resolve!(library, symbols::DEVICE_CLOSE),
            asset_load: resolve!(library, symbols::ASSET_LOAD_FROM_BINARY_DATA),
            asset_unload: resolve!(library, symbols::ASSET_UNLOAD),
            create_playable: resolve!(library, symbols::HAPTIC_CREATE_PLAYABLE),
            remove_playable: resolve!(library, symbols::HAPTIC_REMOVE_PLAYABLE),
            clear_all_playables: resolve!(library, symbols::HAPTIC_CLEAR_ALL_PLAYABLES),
            play_playable: resolve!(library, symbols::HAPTIC_PLAY_PLAYABLE),
            stop_playable: resolve!(library, symbols::HAPTIC_STOP_PLAYABLE),
            stop_player: resolve!(library, symbols::HAPTIC_STOP_PLAYER),
            mocap_set_callback: resolve!(library, symbols::MOCAP_SET_SKELETON_CALLBACK),
            mocap_start: resolve!(library, symbols::MOCAP_START_STREAMING),
            mocap_stop: resolve!(library, symbols::MOCAP_STOP_STREAMING),
            mocap_calibrate: resolve!(library, symbols::MOCAP_SKELETON_CALIBRATE),
            mocap_get_bone: resolve!(library, symbols::MOCAP_SKELETON_GET_BONE),
            ppg_set_callback: resolve!(library, symbols::PPG_SET_UPDATE_CALLBACK),
            ppg_start: resolve!(library, symbols::PPG_START_STREAMING),
            ppg_stop: resolve!(library, symbols::PPG_STOP_STREAMING),
            ppg_calibrate: resolve!(library, symbols::PPG_CALIBRATE),
            ppg_node_count: resolve!(library, symbols::PPG_GET_NUMBER_OF_NODES),
            ppg_node_indexes: resolve!(library, symbols::PPG_GET_NODE_INDEXES),
            ppg_heart_rate: resolve!(library, symbols::PPG_GET_HEART_RATE),
            ppg_oxygen: resolve!(library, symbols::PPG_GET_OXYGEN_PERCENT),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        let present = [
            (symbols::INITIALIZE, self.initialize.is_some()),
            (symbols::UNINITIALIZE, self.uninitialize.is_some()),
            (symbols::GET_DEVICE_LIST, self.get_device_list.is_some()),
            (symbols::DEVICE_OPEN, self.device_open.is_some()),
            (symbols::DEVICE_CLOSE, self.device_close.is_some()),
            (symbols::ASSET_LOAD_FROM_BINARY_DATA, self.asset_load.is_some()),
            (symbols::ASSET_UNLOAD, self.asset_unload.is_some()),
            (symbols::HAPTIC_CREATE_PLAYABLE, self.create_playable.is_some()),
            (symbols::HAPTIC_REMOVE_PLAYABLE, self.remove_playable.is_some()),
            (symbols::HAPTIC_CLEAR_ALL_PLAYABLES, self.clear_all_playables.is_some()),
            (symbols::HAPTIC_PLAY_PLAYABLE, self.play_playable.is_some()),
            (symbols::HAPTIC_STOP_PLAYABLE, self.stop_playable.is_some()),
            (symbols::HAPTIC_STOP_PLAYER, self.stop_player.is_some()),
            (symbols::MOCAP_SET_SKELETON_CALLBACK, self.mocap_set_callback.is_some()),
            (symbols::MOCAP_START_STREAMING, self.mocap_start.is_some()),
            (symbols::MOCAP_STOP_STREAMING, self.mocap_stop.is_some()),
            (symbols::MOCAP_SKELETON_CALIBRATE, self.mocap_calibrate.is_some()),
            (symbols::MOCAP_SKELETON_GET_BONE, self.mocap_get_bone.is_some()),
            (symbols::PPG_SET_UPDATE_CALLBACK, self.ppg_set_callback.is_some()),
            (symbols::PPG_START_STREAMING, self.ppg_start.is_some()),
            (symbols::PPG_STOP_STREAMING, self.ppg_stop.is_some()),
            (symbols::PPG_CALIBRATE, self.ppg_calibrate.is_some()),
            (symbols::PPG_GET_NUMBER_OF_NODES, self.ppg_node_count.is_some()),
            (symbols::PPG_GET_NODE_INDEXES, self.ppg_node_indexes.is_some()),
            (symbols::PPG_GET_HEART_RATE, self.ppg_heart_rate.is_some()),
            (symbols::PPG_GET_OXYGEN_PERCENT, self.ppg_oxygen.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(name, found)| (!found).then_some(name))
            .collect()
    }
}

fn require<T>(entry: Option<T>, symbol: &'static str) -> ApiResult<T> {
    entry.ok_or(ApiError::SymbolUnavailable { symbol })
}

fn check(raw: i32, operation: &'static str) -> ApiResult {
    let code = StatusCode::from_raw(raw);
    code.into_result(operation).inspect_err(|_| {
        tracing::error!(operation, code = %code, "Vendor call failed");
    })
}

/// State behind the `user_data` pointer of a skeleton callback.
struct SkeletonContext {
    get_bone: Option<SkeletonGetBoneFn>,
    sink: Arc<dyn SkeletonSink>,
}

impl SkeletonContext {
    fn decode(&self, skeleton: *const c_void) -> SkeletonFrame {
        let Some(get_bone) = self.get_bone else {
            return SkeletonFrame::new();
        };
        BoneIndex::ALL
            .iter()
            .filter_map(|index| {
                let mut bone = MocapBone::default();
                // SAFETY: `skeleton` is the pointer the library passed to the
                // callback currently executing, and `bone` is a live out slot.
                let raw = unsafe { get_bone(skeleton, index.as_raw() as c_int, &mut bone) };
                StatusCode::from_raw(raw).is_good().then_some((*index, bone))
            })
            .collect()
    }
}

/// State behind the `user_data` pointer of a PPG callback.
struct PpgContext {
    node_count: Option<PpgNodeCountFn>,
    node_indexes: Option<PpgNodeIndexesFn>,
    heart_rate: Option<PpgHeartRateFn>,
    oxygen: Option<PpgOxygenFn>,
    sink: Arc<dyn PpgSink>,
}

impl PpgContext {
    fn decode(&self, data: *const c_void) -> PpgFrame {
        let (Some(node_count), Some(node_indexes), Some(heart_rate), Some(oxygen)) =
            (self.node_count, self.node_indexes, self.heart_rate, self.oxygen)
        else {
            return PpgFrame::default();
        };

        let mut count = 0_u8;
        // SAFETY: `data` is the pointer handed to the running callback.
        let raw = unsafe { node_count(data, &mut count) };
        if !StatusCode::from_raw(raw).is_good() || count == 0 {
            return PpgFrame::default();
        }

        let mut indexes = vec![0_u8; usize::from(count)];
        // SAFETY: `indexes` holds exactly `count` writable bytes.
        let raw = unsafe { node_indexes(data, indexes.as_mut_ptr(), count) };
        if !StatusCode::from_raw(raw).is_good() {
            return PpgFrame::default();
        }

        let nodes = indexes
            .into_iter()
            .filter_map(|index| {
                let mut node = PpgNode {
                    index,
                    ..PpgNode::default()
                };
                // SAFETY: `data` is valid for this callback and the out slot is live.
                let hr = unsafe { heart_rate(data, index, &mut node.heart_rate) };
                // SAFETY: as above.
                let ox = unsafe { oxygen(data, index, &mut node.oxygen_percent) };
                (StatusCode::from_raw(hr).is_good() && StatusCode::from_raw(ox).is_good())
                    .then_some(node)
            })
            .collect();
        PpgFrame { nodes }
    }
}

unsafe extern "C" fn skeleton_trampoline(
    dev: *mut RawHandle,
    skeleton: *const c_void,
    user_data: *mut c_void,
) {
    if user_data.is_null() {
        return;
    }
    // SAFETY: `user_data` is the boxed context registered in `set_skeleton_sink`;
    // replaced contexts are retired and only freed once streaming on their
    // device has stopped, or when the owning `NativeApi` drops.
    let context = unsafe { &*user_data.cast::<SkeletonContext>() };
    let Some(device) = DeviceHandle::from_ptr(dev) else {
        return;
    };
    let frame = context.decode(skeleton);
    context.sink.on_skeleton(device, &frame);
}

unsafe extern "C" fn ppg_trampoline(
    dev: *mut RawHandle,
    data: *const c_void,
    user_data: *mut c_void,
) {
    if user_data.is_null() {
        return;
    }
    // SAFETY: same lifetime argument as `skeleton_trampoline`.
    let context = unsafe { &*user_data.cast::<PpgContext>() };
    let Some(device) = DeviceHandle::from_ptr(dev) else {
        return;
    };
    let frame = context.decode(data);
    context.sink.on_ppg(device, &frame);
}

/// Callback contexts registered per device.
struct ContextSlots<T> {
    live: HashMap<DeviceHandle, Box<T>>,
    // Replaced contexts may still be in use by an in-flight vendor callback
    // until streaming on their device stops.
    retired: HashMap<DeviceHandle, Vec<Box<T>>>,
}

impl<T> Default for ContextSlots<T> {
    fn default() -> Self {
        Self {
            live: HashMap::new(),
            retired: HashMap::new(),
        }
    }
}

impl<T> ContextSlots<T> {
    /// Install `context` for `device`, or clear it with `None`, retiring
    /// the context it replaces.
    fn replace(&mut self, device: DeviceHandle, context: Option<Box<T>>) {
        let previous = match context {
            Some(context) => self.live.insert(device, context),
            None => self.live.remove(&device),
        };
        if let Some(previous) = previous {
            self.retired.entry(device).or_default().push(previous);
        }
    }

    /// Free the contexts retired for `device`. Returns how many were freed.
    fn free_retired(&mut self, device: DeviceHandle) -> usize {
        self.retired.remove(&device).map_or(0, |retired| retired.len())
    }

    fn retired_count(&self) -> usize {
        self.retired.values().map(Vec::len).sum()
    }
}

#[derive(Default)]
struct CallbackContexts {
    skeleton: ContextSlots<SkeletonContext>,
    ppg: ContextSlots<PpgContext>,
}

/// Vendor library opened with `libloading` and its resolved entry points.
pub struct NativeApi {
    table: SymbolTable,
    contexts: Mutex<CallbackContexts>,
    // Declared last so it is unmapped after the contexts drop.
    _library: Library,
}

impl NativeApi {
    /// Resolve every known entry point of an opened library.
    pub fn from_library(library: Library) -> Self {
        let table = SymbolTable::resolve(&library);
        let missing = table.missing();
        if !missing.is_empty() {
            tracing::warn!(
                missing = ?missing,
                "Vendor library lacks some entry points; dependent calls will fail"
            );
        }
        Self {
            table,
            contexts: Mutex::new(CallbackContexts::default()),
            _library: library,
        }
    }

    /// Names of the entry points this library does not export.
    pub fn missing_symbols(&self) -> Vec<&'static str> {
        self.table.missing()
    }

    fn device_call(
        &self,
        entry: Option<DeviceFn>,
        symbol: &'static str,
        device: DeviceHandle,
    ) -> ApiResult {
        let f = require(entry, symbol)?;
        // SAFETY: `device` was returned by `ts_device_open` of this library.
        check(unsafe { f(device.as_ptr()) }, symbol)
    }

    fn playable_call(
        &self,
        entry: Option<PlayableFn>,
        symbol: &'static str,
        device: DeviceHandle,
        playable: PlayableId,
    ) -> ApiResult {
        let f = require(entry, symbol)?;
        // SAFETY: `device` was returned by `ts_device_open` of this library.
        check(unsafe { f(device.as_ptr(), playable.0) }, symbol)
    }
}

impl VendorApi for NativeApi {
    fn initialize(&self) -> ApiResult {
        let f = require(self.table.initialize, symbols::INITIALIZE)?;
        // SAFETY: takes no arguments.
        check(unsafe { f() }, symbols::INITIALIZE)
    }

    fn uninitialize(&self) -> ApiResult {
        let f = require(self.table.uninitialize, symbols::UNINITIALIZE)?;
        // SAFETY: takes no arguments.
        unsafe { f() };
        Ok(())
    }

    fn enumerate_devices(&self, buffer: &mut [DeviceDescriptor]) -> ApiResult<usize> {
        let f = require(self.table.get_device_list, symbols::GET_DEVICE_LIST)?;
        let capacity = u32::try_from(buffer.len()).unwrap_or(u32::MAX);
        let mut size = capacity;
        // SAFETY: `buffer` has room for `capacity` descriptors.
        check(unsafe { f(buffer.as_mut_ptr(), &mut size) }, symbols::GET_DEVICE_LIST)?;
        Ok(usize::try_from(size.min(capacity)).unwrap_or(buffer.len()))
    }

    fn open_device(&self, descriptor: &DeviceDescriptor) -> ApiResult<DeviceHandle> {
        let f = require(self.table.device_open, symbols::DEVICE_OPEN)?;
        // SAFETY: `descriptor` is a valid `TsDevice` for the duration of the call.
        let raw = unsafe { f(descriptor) };
        DeviceHandle::from_ptr(raw).ok_or(ApiError::NullHandle {
            operation: symbols::DEVICE_OPEN,
        })
    }

    fn close_device(&self, device: DeviceHandle) -> ApiResult {
        let f = require(self.table.device_close, symbols::DEVICE_CLOSE)?;
        // SAFETY: `device` was returned by `ts_device_open` of this library.
        unsafe { f(device.as_ptr()) };
        Ok(())
    }

    fn load_asset(&self, data: &[u8]) -> ApiResult<AssetHandle> {
        let f = require(self.table.asset_load, symbols::ASSET_LOAD_FROM_BINARY_DATA)?;
        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
        // SAFETY: `data` is readable for `size` bytes; the library copies it.
        let raw = unsafe { f(data.as_ptr(), size) };
        AssetHandle::from_ptr(raw).ok_or(ApiError::NullHandle {
            operation: symbols::ASSET_LOAD_FROM_BINARY_DATA,
        })
    }

    fn unload_asset(&self, asset: AssetHandle) -> ApiResult {
        let f = require(self.table.asset_unload, symbols::ASSET_UNLOAD)?;
        // SAFETY: `asset` was returned by `ts_asset_load_from_binary_data`.
        unsafe { f(asset.as_ptr()) };
        Ok(())
    }

    fn create_playable(
        &self,
        device: DeviceHandle,
        asset: AssetHandle,
        looped: bool,
    ) -> ApiResult<PlayableId> {
        let f = require(self.table.create_playable, symbols::HAPTIC_CREATE_PLAYABLE)?;
        let mut id = 0_u64;
        // SAFETY: both handles come from this library and `id` is a live out slot.
        let raw = unsafe { f(device.as_ptr(), asset.as_ptr(), looped, &mut id) };
        check(raw, symbols::HAPTIC_CREATE_PLAYABLE)?;
        Ok(PlayableId(id))
    }

    fn remove_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult {
        self.playable_call(
            self.table.remove_playable,
            symbols::HAPTIC_REMOVE_PLAYABLE,
            device,
            playable,
        )
    }

    fn clear_all_playables(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(
            self.table.clear_all_playables,
            symbols::HAPTIC_CLEAR_ALL_PLAYABLES,
            device,
        )
    }

    fn play_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult {
        self.playable_call(
            self.table.play_playable,
            symbols::HAPTIC_PLAY_PLAYABLE,
            device,
            playable,
        )
    }

    fn stop_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult {
        self.playable_call(
            self.table.stop_playable,
            symbols::HAPTIC_STOP_PLAYABLE,
            device,
            playable,
        )
    }

    fn stop_player(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(self.table.stop_player, symbols::HAPTIC_STOP_PLAYER, device)
    }

    fn set_skeleton_sink(
        &self,
        device: DeviceHandle,
        sink: Option<Arc<dyn SkeletonSink>>,
    ) -> ApiResult {
        let f = require(self.table.mocap_set_callback, symbols::MOCAP_SET_SKELETON_CALLBACK)?;
        let mut contexts = self.contexts.lock();
        let context = sink.map(|sink| {
            Box::new(SkeletonContext {
                get_bone: self.table.mocap_get_bone,
                sink,
            })
        });
        let (callback, user_data) = match &context {
            Some(context) => (
                Some(skeleton_trampoline as ffi::SkeletonCallback),
                std::ptr::from_ref::<SkeletonContext>(context).cast_mut().cast::<c_void>(),
            ),
            None => (None, std::ptr::null_mut()),
        };
        // SAFETY: `user_data` points into a box kept alive by `contexts`.
        let raw = unsafe { f(device.as_ptr(), callback, user_data) };
        check(raw, symbols::MOCAP_SET_SKELETON_CALLBACK).map_err(|_| {
            ApiError::CallbackRejected {
                operation: symbols::MOCAP_SET_SKELETON_CALLBACK,
            }
        })?;
        contexts.skeleton.replace(device, context);
        Ok(())
    }

    fn mocap_start_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(self.table.mocap_start, symbols::MOCAP_START_STREAMING, device)
    }

    fn mocap_stop_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(self.table.mocap_stop, symbols::MOCAP_STOP_STREAMING, device)?;
        let freed = self.contexts.lock().skeleton.free_retired(device);
        if freed > 0 {
            tracing::trace!(device = %device, freed, "Freed retired skeleton callback contexts");
        }
        Ok(())
    }

    fn mocap_calibrate(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(
            self.table.mocap_calibrate,
            symbols::MOCAP_SKELETON_CALIBRATE,
            device,
        )
    }

    fn set_ppg_sink(&self, device: DeviceHandle, sink: Option<Arc<dyn PpgSink>>) -> ApiResult {
        let f = require(self.table.ppg_set_callback, symbols::PPG_SET_UPDATE_CALLBACK)?;
        let mut contexts = self.contexts.lock();
        let context = sink.map(|sink| {
            Box::new(PpgContext {
                node_count: self.table.ppg_node_count,
                node_indexes: self.table.ppg_node_indexes,
                heart_rate: self.table.ppg_heart_rate,
                oxygen: self.table.ppg_oxygen,
                sink,
            })
        });
        let (callback, user_data) = match &context {
            Some(context) => (
                Some(ppg_trampoline as ffi::PpgCallback),
                std::ptr::from_ref::<PpgContext>(context).cast_mut().cast::<c_void>(),
            ),
            None => (None, std::ptr::null_mut()),
        };
        // SAFETY: `user_data` points into a box kept alive by `contexts`.
        let raw = unsafe { f(device.as_ptr(), callback, user_data) };
        check(raw, symbols::PPG_SET_UPDATE_CALLBACK).map_err(|_| ApiError::CallbackRejected {
            operation: symbols::PPG_SET_UPDATE_CALLBACK,
        })?;
        contexts.ppg.replace(device, context);
        Ok(())
    }

    fn ppg_start_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(self.table.ppg_start, symbols::PPG_START_STREAMING, device)
    }

    fn ppg_stop_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(self.table.ppg_stop, symbols::PPG_STOP_STREAMING, device)?;
        let freed = self.contexts.lock().ppg.free_retired(device);
        if freed > 0 {
            tracing::trace!(device = %device, freed, "Freed retired PPG callback contexts");
        }
        Ok(())
    }

    fn ppg_calibrate(&self, device: DeviceHandle) -> ApiResult {
        self.device_call(self.table.ppg_calibrate, symbols::PPG_CALIBRATE, device)
    }
}

impl std::fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let contexts = self.contexts.lock();
        f.debug_struct("NativeApi")
            .field("missing_symbols", &self.table.missing())
            .field(
                "retired_contexts",
                &(contexts.skeleton.retired_count() + contexts.ppg.retired_count()),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(raw: usize) -> Result<DeviceHandle, &'static str> {
        DeviceHandle::from_raw(raw).ok_or("null handle")
    }

    #[test]
    fn test_replaced_contexts_are_retired_per_device() -> Result<(), &'static str> {
        let (a, b) = (handle(1)?, handle(2)?);
        let mut slots = ContextSlots::<u32>::default();
        slots.replace(a, Some(Box::new(1)));
        slots.replace(a, Some(Box::new(2)));
        slots.replace(b, Some(Box::new(3)));
        slots.replace(a, None);

        assert_eq!(slots.retired_count(), 2);
        assert!(slots.live.contains_key(&b));
        assert!(!slots.live.contains_key(&a));
        Ok(())
    }

    #[test]
    fn test_free_retired_only_touches_stopped_device() -> Result<(), &'static str> {
        let (a, b) = (handle(1)?, handle(2)?);
        let mut slots = ContextSlots::<u32>::default();
        for n in 0..3 {
            slots.replace(a, Some(Box::new(n)));
            slots.replace(b, Some(Box::new(n)));
        }

        assert_eq!(slots.free_retired(a), 2);
        assert_eq!(slots.free_retired(a), 0);
        assert_eq!(slots.retired_count(), 2);
        assert_eq!(slots.live.len(), 2);
        Ok(())
    }
}
