//! Scriptable stand-in for the vendor library.
//!
//! [`MockVendorApi`] keeps a list of attached devices, hands out fake
//! handles, records every call that reached an exported entry point, and can
//! be told to drop symbols, fail opens or asset loads, or return a bad status
//! from any entry point.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use teslasuit_api::ffi::symbols;
use teslasuit_api::{
    AssetHandle, DeviceDescriptor, DeviceHandle, PlayableId, PpgFrame, PpgSink, SkeletonFrame,
    SkeletonSink, VendorApi,
};
use teslasuit_errors::{ApiError, ApiResult, StatusCode};

/// One call that reached the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Initialize,
    Uninitialize,
    EnumerateDevices { capacity: usize },
    OpenDevice([u8; 16]),
    CloseDevice(DeviceHandle),
    LoadAsset { len: usize },
    UnloadAsset(AssetHandle),
    CreatePlayable {
        device: DeviceHandle,
        asset: AssetHandle,
        looped: bool,
    },
    RemovePlayable(DeviceHandle, PlayableId),
    ClearAllPlayables(DeviceHandle),
    PlayPlayable(DeviceHandle, PlayableId),
    StopPlayable(DeviceHandle, PlayableId),
    StopPlayer(DeviceHandle),
    SetSkeletonSink { device: DeviceHandle, installed: bool },
    MocapStart(DeviceHandle),
    MocapStop(DeviceHandle),
    MocapCalibrate(DeviceHandle),
    SetPpgSink { device: DeviceHandle, installed: bool },
    PpgStart(DeviceHandle),
    PpgStop(DeviceHandle),
    PpgCalibrate(DeviceHandle),
}

impl ApiCall {
    /// Whether this call releases haptic playables.
    pub fn is_playable_removal(&self) -> bool {
        matches!(
            self,
            ApiCall::RemovePlayable(..) | ApiCall::ClearAllPlayables(_)
        )
    }

    /// Whether this call unloads an asset.
    pub fn is_asset_unload(&self) -> bool {
        matches!(self, ApiCall::UnloadAsset(_))
    }
}

#[derive(Default)]
struct MockState {
    attached: Vec<DeviceDescriptor>,
    open: HashMap<DeviceHandle, [u8; 16]>,
    assets: HashSet<AssetHandle>,
    playables: HashMap<PlayableId, (DeviceHandle, AssetHandle)>,
    next_handle: usize,
    next_playable: u64,
    calls: Vec<ApiCall>,
    missing: HashSet<&'static str>,
    failing_status: HashMap<&'static str, StatusCode>,
    failing_opens: HashSet<[u8; 16]>,
    failing_asset_loads: usize,
    skeleton_sinks: HashMap<DeviceHandle, Arc<dyn SkeletonSink>>,
    ppg_sinks: HashMap<DeviceHandle, Arc<dyn PpgSink>>,
}

impl MockState {
    fn next_handle(&mut self) -> usize {
        self.next_handle += 1;
        0x1000 + self.next_handle * 0x10
    }

    fn enter(&mut self, symbol: &'static str, call: ApiCall) -> ApiResult {
        if self.missing.contains(symbol) {
            return Err(ApiError::SymbolUnavailable { symbol });
        }
        self.calls.push(call);
        match self.failing_status.get(symbol) {
            Some(code) => Err(ApiError::Status {
                operation: symbol,
                code: *code,
            }),
            None => Ok(()),
        }
    }
}

/// In-memory vendor library.
#[derive(Default)]
pub struct MockVendorApi {
    state: Mutex<MockState>,
}

impl MockVendorApi {
    /// Create a mock with no devices attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared mock.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Plug in a device; it shows up on the next enumeration.
    pub fn attach(&self, uuid: [u8; 16]) {
        let mut state = self.state.lock();
        if !state.attached.iter().any(|d| d.uuid == uuid) {
            state.attached.push(DeviceDescriptor::new(uuid));
        }
    }

    /// Unplug a device.
    pub fn detach(&self, uuid: [u8; 16]) {
        self.state.lock().attached.retain(|d| d.uuid != uuid);
    }

    /// Make `ts_device_open` return null for `uuid` while `failing` is set.
    pub fn fail_open(&self, uuid: [u8; 16], failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing_opens.insert(uuid);
        } else {
            state.failing_opens.remove(&uuid);
        }
    }

    /// Make the next `count` asset loads return null.
    pub fn fail_asset_loads(&self, count: usize) {
        self.state.lock().failing_asset_loads = count;
    }

    /// Pretend the library does not export `symbol`.
    pub fn remove_symbol(&self, symbol: &'static str) {
        self.state.lock().missing.insert(symbol);
    }

    /// Export `symbol` again.
    pub fn restore_symbol(&self, symbol: &'static str) {
        self.state.lock().missing.remove(symbol);
    }

    /// Make every call to `symbol` return `code`.
    pub fn fail_status(&self, symbol: &'static str, code: StatusCode) {
        self.state.lock().failing_status.insert(symbol, code);
    }

    /// Let calls to `symbol` succeed again.
    pub fn clear_status(&self, symbol: &'static str) {
        self.state.lock().failing_status.remove(symbol);
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Number of recorded device opens.
    pub fn open_count(&self) -> usize {
        self.count_calls(|c| matches!(c, ApiCall::OpenDevice(_)))
    }

    /// Number of recorded asset loads.
    pub fn asset_load_count(&self) -> usize {
        self.count_calls(|c| matches!(c, ApiCall::LoadAsset { .. }))
    }

    /// Handle of the open device with `uuid`, if any.
    pub fn handle_for(&self, uuid: [u8; 16]) -> Option<DeviceHandle> {
        self.state
            .lock()
            .open
            .iter()
            .find_map(|(handle, id)| (*id == uuid).then_some(*handle))
    }

    /// Number of device handles not yet closed.
    pub fn open_handle_count(&self) -> usize {
        self.state.lock().open.len()
    }

    /// Number of assets loaded and not yet unloaded.
    pub fn loaded_asset_count(&self) -> usize {
        self.state.lock().assets.len()
    }

    /// Number of playables alive in the mock.
    pub fn live_playable_count(&self) -> usize {
        self.state.lock().playables.len()
    }

    /// Whether a skeleton sink is installed for `device`.
    pub fn has_skeleton_sink(&self, device: DeviceHandle) -> bool {
        self.state.lock().skeleton_sinks.contains_key(&device)
    }

    /// Whether a PPG sink is installed for `device`.
    pub fn has_ppg_sink(&self, device: DeviceHandle) -> bool {
        self.state.lock().ppg_sinks.contains_key(&device)
    }

    /// Deliver a skeleton update the way the vendor thread would.
    /// Returns whether a sink was installed.
    pub fn emit_skeleton(&self, device: DeviceHandle, frame: &SkeletonFrame) -> bool {
        let sink = self.state.lock().skeleton_sinks.get(&device).cloned();
        match sink {
            Some(sink) => {
                sink.on_skeleton(device, frame);
                true
            }
            None => false,
        }
    }

    /// Deliver a PPG update the way the vendor thread would.
    /// Returns whether a sink was installed.
    pub fn emit_ppg(&self, device: DeviceHandle, frame: &PpgFrame) -> bool {
        let sink = self.state.lock().ppg_sinks.get(&device).cloned();
        match sink {
            Some(sink) => {
                sink.on_ppg(device, frame);
                true
            }
            None => false,
        }
    }
}

impl VendorApi for MockVendorApi {
    fn initialize(&self) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::INITIALIZE, ApiCall::Initialize)
    }

    fn uninitialize(&self) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::UNINITIALIZE, ApiCall::Uninitialize)
    }

    fn enumerate_devices(&self, buffer: &mut [DeviceDescriptor]) -> ApiResult<usize> {
        let mut state = self.state.lock();
        state.enter(
            symbols::GET_DEVICE_LIST,
            ApiCall::EnumerateDevices {
                capacity: buffer.len(),
            },
        )?;
        let count = state.attached.len().min(buffer.len());
        for (slot, device) in buffer.iter_mut().zip(state.attached.iter()) {
            *slot = *device;
        }
        Ok(count)
    }

    fn open_device(&self, descriptor: &DeviceDescriptor) -> ApiResult<DeviceHandle> {
        let mut state = self.state.lock();
        state.enter(symbols::DEVICE_OPEN, ApiCall::OpenDevice(descriptor.uuid))?;
        if state.failing_opens.contains(&descriptor.uuid) {
            return Err(ApiError::NullHandle {
                operation: symbols::DEVICE_OPEN,
            });
        }
        let raw = state.next_handle();
        let handle = DeviceHandle::from_raw(raw).ok_or(ApiError::NullHandle {
            operation: symbols::DEVICE_OPEN,
        })?;
        state.open.insert(handle, descriptor.uuid);
        Ok(handle)
    }

    fn close_device(&self, device: DeviceHandle) -> ApiResult {
        let mut state = self.state.lock();
        state.enter(symbols::DEVICE_CLOSE, ApiCall::CloseDevice(device))?;
        state.open.remove(&device);
        Ok(())
    }

    fn load_asset(&self, data: &[u8]) -> ApiResult<AssetHandle> {
        let mut state = self.state.lock();
        state.enter(
            symbols::ASSET_LOAD_FROM_BINARY_DATA,
            ApiCall::LoadAsset { len: data.len() },
        )?;
        if state.failing_asset_loads > 0 {
            state.failing_asset_loads -= 1;
            return Err(ApiError::NullHandle {
                operation: symbols::ASSET_LOAD_FROM_BINARY_DATA,
            });
        }
        let raw = state.next_handle();
        let handle = AssetHandle::from_raw(raw).ok_or(ApiError::NullHandle {
            operation: symbols::ASSET_LOAD_FROM_BINARY_DATA,
        })?;
        state.assets.insert(handle);
        Ok(handle)
    }

    fn unload_asset(&self, asset: AssetHandle) -> ApiResult {
        let mut state = self.state.lock();
        state.enter(symbols::ASSET_UNLOAD, ApiCall::UnloadAsset(asset))?;
        state.assets.remove(&asset);
        Ok(())
    }

    fn create_playable(
        &self,
        device: DeviceHandle,
        asset: AssetHandle,
        looped: bool,
    ) -> ApiResult<PlayableId> {
        let mut state = self.state.lock();
        state.enter(
            symbols::HAPTIC_CREATE_PLAYABLE,
            ApiCall::CreatePlayable {
                device,
                asset,
                looped,
            },
        )?;
        if !state.assets.contains(&asset) {
            return Err(ApiError::Status {
                operation: symbols::HAPTIC_CREATE_PLAYABLE,
                code: StatusCode::NotFound,
            });
        }
        state.next_playable += 1;
        let id = PlayableId(state.next_playable);
        state.playables.insert(id, (device, asset));
        Ok(id)
    }

    fn remove_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult {
        let mut state = self.state.lock();
        state.enter(
            symbols::HAPTIC_REMOVE_PLAYABLE,
            ApiCall::RemovePlayable(device, playable),
        )?;
        match state.playables.remove(&playable) {
            Some(_) => Ok(()),
            None => Err(ApiError::Status {
                operation: symbols::HAPTIC_REMOVE_PLAYABLE,
                code: StatusCode::NotFound,
            }),
        }
    }

    fn clear_all_playables(&self, device: DeviceHandle) -> ApiResult {
        let mut state = self.state.lock();
        state.enter(
            symbols::HAPTIC_CLEAR_ALL_PLAYABLES,
            ApiCall::ClearAllPlayables(device),
        )?;
        state.playables.retain(|_, (owner, _)| *owner != device);
        Ok(())
    }

    fn play_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult {
        self.state.lock().enter(
            symbols::HAPTIC_PLAY_PLAYABLE,
            ApiCall::PlayPlayable(device, playable),
        )
    }

    fn stop_playable(&self, device: DeviceHandle, playable: PlayableId) -> ApiResult {
        self.state.lock().enter(
            symbols::HAPTIC_STOP_PLAYABLE,
            ApiCall::StopPlayable(device, playable),
        )
    }

    fn stop_player(&self, device: DeviceHandle) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::HAPTIC_STOP_PLAYER, ApiCall::StopPlayer(device))
    }

    fn set_skeleton_sink(
        &self,
        device: DeviceHandle,
        sink: Option<Arc<dyn SkeletonSink>>,
    ) -> ApiResult {
        let mut state = self.state.lock();
        state.enter(
            symbols::MOCAP_SET_SKELETON_CALLBACK,
            ApiCall::SetSkeletonSink {
                device,
                installed: sink.is_some(),
            },
        )?;
        match sink {
            Some(sink) => state.skeleton_sinks.insert(device, sink),
            None => state.skeleton_sinks.remove(&device),
        };
        Ok(())
    }

    fn mocap_start_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::MOCAP_START_STREAMING, ApiCall::MocapStart(device))
    }

    fn mocap_stop_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::MOCAP_STOP_STREAMING, ApiCall::MocapStop(device))
    }

    fn mocap_calibrate(&self, device: DeviceHandle) -> ApiResult {
        self.state.lock().enter(
            symbols::MOCAP_SKELETON_CALIBRATE,
            ApiCall::MocapCalibrate(device),
        )
    }

    fn set_ppg_sink(&self, device: DeviceHandle, sink: Option<Arc<dyn PpgSink>>) -> ApiResult {
        let mut state = self.state.lock();
        state.enter(
            symbols::PPG_SET_UPDATE_CALLBACK,
            ApiCall::SetPpgSink {
                device,
                installed: sink.is_some(),
            },
        )?;
        match sink {
            Some(sink) => state.ppg_sinks.insert(device, sink),
            None => state.ppg_sinks.remove(&device),
        };
        Ok(())
    }

    fn ppg_start_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::PPG_START_STREAMING, ApiCall::PpgStart(device))
    }

    fn ppg_stop_streaming(&self, device: DeviceHandle) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::PPG_STOP_STREAMING, ApiCall::PpgStop(device))
    }

    fn ppg_calibrate(&self, device: DeviceHandle) -> ApiResult {
        self.state
            .lock()
            .enter(symbols::PPG_CALIBRATE, ApiCall::PpgCalibrate(device))
    }
}

impl std::fmt::Debug for MockVendorApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockVendorApi")
            .field("attached", &state.attached.len())
            .field("open", &state.open.len())
            .field("calls", &state.calls.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_clamps_to_capacity() {
        let api = MockVendorApi::new();
        for n in 0..4_u8 {
            api.attach([n; 16]);
        }
        let mut buffer = [DeviceDescriptor::default(); 2];
        assert_eq!(api.enumerate_devices(&mut buffer).unwrap(), 2);
        assert_eq!(buffer[1].uuid, [1; 16]);
    }

    #[test]
    fn test_missing_symbol_is_not_recorded() {
        let api = MockVendorApi::new();
        api.remove_symbol(symbols::INITIALIZE);
        assert_eq!(
            api.initialize(),
            Err(ApiError::SymbolUnavailable {
                symbol: symbols::INITIALIZE
            })
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_clear_all_only_touches_one_device() {
        let api = MockVendorApi::new();
        api.attach([1; 16]);
        api.attach([2; 16]);
        let a = api.open_device(&DeviceDescriptor::new([1; 16])).unwrap();
        let b = api.open_device(&DeviceDescriptor::new([2; 16])).unwrap();
        let asset = api.load_asset(b"asset").unwrap();
        api.create_playable(a, asset, false).unwrap();
        api.create_playable(b, asset, false).unwrap();

        api.clear_all_playables(a).unwrap();
        assert_eq!(api.live_playable_count(), 1);
    }
}
