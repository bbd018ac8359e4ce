//! Haptic asset cache and playable bookkeeping.
//!
//! Assets are loaded into the vendor library once per [`AssetId`] and the
//! resulting handle is cached until unloaded. Every device that received a
//! playable is remembered so teardown can clear it in bulk; a device leaves
//! the set only once [`HapticAssetManager::remove_all_playables`] cleared it.
//!
//! Players share assets through [`HapticAssetManager::acquire_asset`] and
//! [`HapticAssetManager::release_asset`]; an acquired asset is unloaded when
//! its last user releases it.
//!
//! The capability table is fetched from the loader on every call, so a
//! manager keeps working across library reloads.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use teslasuit_api::{AssetHandle, DeviceHandle, LibraryLoader, PlayableId, VendorApi};
use teslasuit_errors::ApiError;
use tracing::{debug, error, info};

use crate::asset::{AssetId, HapticAsset};

#[derive(Debug, Default)]
struct Cache {
    assets: HashMap<AssetId, AssetHandle>,
    used_devices: BTreeSet<DeviceHandle>,
    users: HashMap<AssetId, usize>,
}

/// Owns every asset handle and tracks devices holding playables.
///
/// Dropping the manager clears playables on every used device before it
/// unloads any asset.
pub struct HapticAssetManager {
    loader: Arc<LibraryLoader>,
    cache: Mutex<Cache>,
}

impl HapticAssetManager {
    /// Create an empty manager.
    pub fn new(loader: Arc<LibraryLoader>) -> Self {
        info!("Haptic asset manager created");
        Self {
            loader,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// The shared loader.
    pub fn loader(&self) -> &Arc<LibraryLoader> {
        &self.loader
    }

    fn api(&self) -> Result<Arc<dyn VendorApi>, ApiError> {
        self.loader.require()
    }

    /// Load `asset` into the vendor library, or return its cached handle.
    ///
    /// A failed load caches nothing, so the next call retries.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of the failed vendor load.
    pub fn load_asset(&self, asset: &HapticAsset) -> Result<AssetHandle, ApiError> {
        let mut cache = self.cache.lock();
        if let Some(handle) = cache.assets.get(&asset.id()) {
            debug!(asset = %asset.id(), handle = %handle, "Asset served from cache");
            return Ok(*handle);
        }

        let handle = self
            .api()
            .and_then(|api| api.load_asset(asset.data()))
            .inspect_err(|err| {
                error!(asset = %asset.id(), name = asset.name(), error = %err, "Failed to load haptic asset");
            })?;
        cache.assets.insert(asset.id(), handle);
        info!(asset = %asset.id(), name = asset.name(), handle = %handle, "Haptic asset loaded");
        Ok(handle)
    }

    /// Load `asset` like [`load_asset`](Self::load_asset) and count the
    /// caller as one of its users.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of the failed vendor load; nothing is
    /// counted in that case.
    pub fn acquire_asset(&self, asset: &HapticAsset) -> Result<AssetHandle, ApiError> {
        let handle = self.load_asset(asset)?;
        let mut cache = self.cache.lock();
        let users = cache.users.entry(asset.id()).or_default();
        *users += 1;
        debug!(asset = %asset.id(), users = *users, "Haptic asset acquired");
        Ok(handle)
    }

    /// Drop one user of `asset` and unload it once nobody uses it.
    /// Returns whether the asset was unloaded.
    pub fn release_asset(&self, asset: &HapticAsset) -> bool {
        let mut cache = self.cache.lock();
        let id = asset.id();
        let Some(users) = cache.users.get_mut(&id) else {
            debug!(asset = %id, "Asset has no users; nothing to release");
            return false;
        };
        *users = users.saturating_sub(1);
        if *users > 0 {
            debug!(asset = %id, users = *users, "Haptic asset still in use");
            return false;
        }
        cache.users.remove(&id);
        let Some(handle) = cache.assets.get(&id).copied() else {
            return false;
        };
        if self.vendor_unload(handle) {
            cache.assets.remove(&id);
            true
        } else {
            false
        }
    }

    /// Number of users that acquired `asset`.
    pub fn asset_users(&self, asset: &HapticAsset) -> usize {
        self.cache.lock().users.get(&asset.id()).copied().unwrap_or_default()
    }

    /// Create a non-looping playable of `asset` on `device`.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of the failed vendor call; `device` is not
    /// recorded in that case.
    pub fn create_playable(
        &self,
        device: DeviceHandle,
        asset: AssetHandle,
    ) -> Result<PlayableId, ApiError> {
        let playable = self
            .api()
            .and_then(|api| api.create_playable(device, asset, false))
            .inspect_err(|err| {
                error!(device = %device, asset = %asset, error = %err, "Failed to create playable");
            })?;
        self.cache.lock().used_devices.insert(device);
        debug!(device = %device, asset = %asset, playable = %playable, "Playable created");
        Ok(playable)
    }

    /// Remove one playable. Leaves the asset cache and used devices alone.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of the failed vendor call.
    pub fn remove_playable(&self, device: DeviceHandle, playable: PlayableId) -> Result<(), ApiError> {
        self.api()
            .and_then(|api| api.remove_playable(device, playable))
            .inspect_err(|err| {
                error!(device = %device, playable = %playable, error = %err, "Failed to remove playable");
            })
    }

    /// Clear every playable on every device that ever received one from
    /// this manager, including playables created by others on those
    /// devices. Returns the number of devices cleared.
    pub fn remove_all_playables(&self) -> usize {
        let mut cache = self.cache.lock();
        if cache.used_devices.is_empty() {
            return 0;
        }
        let api = match self.api() {
            Ok(api) => api,
            Err(err) => {
                error!(devices = cache.used_devices.len(), error = %err, "Failed to remove playables");
                return 0;
            }
        };

        // Devices whose clear failed stay recorded for the next pass.
        let before = cache.used_devices.len();
        cache.used_devices.retain(|device| match api.clear_all_playables(*device) {
            Ok(()) => false,
            Err(err) => {
                error!(device = %device, error = %err, "Failed to clear playables");
                true
            }
        });
        let cleared = before - cache.used_devices.len();
        info!(devices = cleared, "Cleared playables");
        cleared
    }

    /// Unload `asset` if it is cached, regardless of its users. Returns
    /// whether it was unloaded.
    pub fn unload_asset(&self, asset: &HapticAsset) -> bool {
        let mut cache = self.cache.lock();
        let Some(handle) = cache.assets.get(&asset.id()).copied() else {
            debug!(asset = %asset.id(), "Asset not loaded; nothing to unload");
            return false;
        };
        if self.vendor_unload(handle) {
            cache.assets.remove(&asset.id());
            cache.users.remove(&asset.id());
            true
        } else {
            false
        }
    }

    /// Unload an asset by handle. Handles this manager never handed out
    /// are rejected. Returns whether the asset was unloaded.
    pub fn unload_asset_handle(&self, handle: AssetHandle) -> bool {
        let mut cache = self.cache.lock();
        let Some(id) = cache
            .assets
            .iter()
            .find_map(|(id, cached)| (*cached == handle).then_some(*id))
        else {
            error!(handle = %handle, "Cannot unload asset handle that was never loaded");
            return false;
        };
        if self.vendor_unload(handle) {
            cache.assets.remove(&id);
            cache.users.remove(&id);
            true
        } else {
            false
        }
    }

    /// Unload every cached asset. Returns how many were unloaded.
    pub fn unload_all_assets(&self) -> usize {
        let mut cache = self.cache.lock();
        if cache.assets.is_empty() {
            return 0;
        }
        // Handles the vendor refused to unload stay cached for a retry.
        let before = cache.assets.len();
        cache.assets.retain(|_, handle| !self.vendor_unload(*handle));
        let Cache { assets, users, .. } = &mut *cache;
        users.retain(|id, _| assets.contains_key(id));
        let unloaded = before - assets.len();
        info!(assets = unloaded, "Unloaded haptic assets");
        unloaded
    }

    fn vendor_unload(&self, handle: AssetHandle) -> bool {
        match self.api().and_then(|api| api.unload_asset(handle)) {
            Ok(()) => {
                debug!(handle = %handle, "Haptic asset unloaded");
                true
            }
            Err(err) => {
                error!(handle = %handle, error = %err, "Failed to unload haptic asset");
                false
            }
        }
    }

    /// Cached handle of `asset`.
    pub fn cached_handle(&self, asset: &HapticAsset) -> Option<AssetHandle> {
        self.cache.lock().assets.get(&asset.id()).copied()
    }

    /// Number of cached assets.
    pub fn cached_asset_count(&self) -> usize {
        self.cache.lock().assets.len()
    }

    /// Number of devices that will be cleared at teardown.
    pub fn used_device_count(&self) -> usize {
        self.cache.lock().used_devices.len()
    }

    /// Run the teardown sequence now: playables first, then assets.
    pub fn shutdown(&self) {
        self.remove_all_playables();
        self.unload_all_assets();
    }
}

impl Drop for HapticAssetManager {
    fn drop(&mut self) {
        self.shutdown();
        info!("Haptic asset manager dropped");
    }
}

impl std::fmt::Debug for HapticAssetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("HapticAssetManager")
            .field("cached_assets", &cache.assets.len())
            .field("used_devices", &cache.used_devices.len())
            .finish_non_exhaustive()
    }
}
