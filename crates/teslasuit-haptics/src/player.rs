//! Playlist player bound to one device.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use teslasuit_api::{DeviceHandle, PlayableId, VendorApi};
use teslasuit_errors::{HapticError, TeslasuitError};
use tracing::{debug, error, info, warn};

use crate::asset::{AssetId, HapticAsset};
use crate::manager::HapticAssetManager;

/// Plays entries of a haptic playlist on one device.
///
/// Attaching a device loads every playlist asset through the shared
/// [`HapticAssetManager`] and creates one playable per asset. Ending the
/// player (explicitly or on drop) removes those playables and releases the
/// assets; an asset still used by another player stays loaded.
pub struct HapticPlayer {
    manager: Arc<HapticAssetManager>,
    playlist: Vec<HapticAsset>,
    device: Option<DeviceHandle>,
    playables: HashMap<AssetId, PlayableId>,
    acquired: HashSet<AssetId>,
}

impl HapticPlayer {
    /// Create a player with no device attached.
    pub fn new(manager: Arc<HapticAssetManager>, playlist: Vec<HapticAsset>) -> Self {
        Self {
            manager,
            playlist,
            device: None,
            playables: HashMap::new(),
            acquired: HashSet::new(),
        }
    }

    /// The playlist in play order.
    pub fn playlist(&self) -> &[HapticAsset] {
        &self.playlist
    }

    /// Append an asset, creating its playable if a device is attached.
    pub fn push(&mut self, asset: HapticAsset) {
        if let Some(device) = self.device {
            self.prepare(device, &asset);
        }
        self.playlist.push(asset);
    }

    /// Device playback goes to.
    pub fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    /// Playable created for playlist entry `index`.
    pub fn playable(&self, index: usize) -> Option<PlayableId> {
        self.playlist
            .get(index)
            .and_then(|asset| self.playables.get(&asset.id()))
            .copied()
    }

    /// Attach the player to `device`, or detach it with `None`.
    ///
    /// Playables on the previous device are removed first. Returns the
    /// number of playables created on the new device; entries whose asset
    /// failed to load have none.
    pub fn set_device(&mut self, device: Option<DeviceHandle>) -> usize {
        if self.device == device {
            return self.playables.len();
        }
        self.release_playables();
        self.device = device;
        let Some(device) = device else {
            debug!("Haptic player detached");
            return 0;
        };

        let mut created = 0;
        for asset in self.playlist.clone() {
            if self.prepare(device, &asset) {
                created += 1;
            }
        }
        info!(device = %device, created, entries = self.playlist.len(), "Haptic player attached");
        created
    }

    fn prepare(&mut self, device: DeviceHandle, asset: &HapticAsset) -> bool {
        let handle = if self.acquired.contains(&asset.id()) {
            self.manager.load_asset(asset)
        } else {
            self.manager.acquire_asset(asset).inspect(|_| {
                self.acquired.insert(asset.id());
            })
        };
        let playable = handle.and_then(|handle| self.manager.create_playable(device, handle));
        match playable {
            Ok(playable) => {
                self.playables.insert(asset.id(), playable);
                true
            }
            Err(err) => {
                warn!(asset = %asset.id(), error = %err, "Playlist entry has no playable");
                false
            }
        }
    }

    fn release_playables(&mut self) {
        let Some(device) = self.device else {
            return;
        };
        for (_, playable) in self.playables.drain() {
            // Failures are logged by the manager.
            if self.manager.remove_playable(device, playable).is_err() {
                debug!(device = %device, playable = %playable, "Playable already gone");
            }
        }
    }

    fn target(&self, index: usize) -> Result<(DeviceHandle, PlayableId), HapticError> {
        let device = self.device.ok_or(HapticError::NoDevice)?;
        let asset = self
            .playlist
            .get(index)
            .ok_or(HapticError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            })?;
        let playable = self
            .playables
            .get(&asset.id())
            .copied()
            .ok_or(HapticError::NoPlayable(index))?;
        Ok((device, playable))
    }

    /// Start playlist entry `index`.
    ///
    /// # Errors
    ///
    /// [`HapticError`] when no device is attached, `index` is out of range
    /// or the entry has no playable; an API error if the vendor call fails.
    pub fn play(&self, index: usize) -> Result<(), TeslasuitError> {
        let (device, playable) = self.target(index).inspect_err(|err| {
            error!(index, error = %err, "Failed to play haptic asset");
        })?;
        let api = self.manager_api()?;
        api.play_playable(device, playable).inspect_err(|err| {
            error!(device = %device, playable = %playable, error = %err, "Failed to play haptic asset");
        })?;
        debug!(device = %device, index, "Playing haptic asset");
        Ok(())
    }

    /// Stop playlist entry `index`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`play`](Self::play).
    pub fn stop(&self, index: usize) -> Result<(), TeslasuitError> {
        let (device, playable) = self.target(index).inspect_err(|err| {
            error!(index, error = %err, "Failed to stop haptic asset");
        })?;
        let api = self.manager_api()?;
        api.stop_playable(device, playable).inspect_err(|err| {
            error!(device = %device, playable = %playable, error = %err, "Failed to stop haptic asset");
        })?;
        debug!(device = %device, index, "Stopped haptic asset");
        Ok(())
    }

    /// Stop everything playing on the attached device.
    ///
    /// # Errors
    ///
    /// [`HapticError::NoDevice`] without a device, or the vendor error.
    pub fn stop_player(&self) -> Result<(), TeslasuitError> {
        let device = self.device.ok_or(HapticError::NoDevice).inspect_err(|err| {
            error!(error = %err, "Failed to stop haptic player");
        })?;
        let api = self.manager_api()?;
        api.stop_player(device).inspect_err(|err| {
            error!(device = %device, error = %err, "Failed to stop haptic player");
        })?;
        debug!(device = %device, "Stopped haptic player");
        Ok(())
    }

    fn manager_api(&self) -> Result<Arc<dyn VendorApi>, TeslasuitError> {
        self.manager.loader().require().map_err(TeslasuitError::from)
    }

    /// Remove this player's playables and release its assets. The player
    /// keeps its playlist and can be attached again.
    pub fn end(&mut self) {
        if self.device.is_none() {
            return;
        }
        self.release_playables();
        for asset in &self.playlist {
            if self.acquired.remove(&asset.id()) {
                self.manager.release_asset(asset);
            }
        }
        self.device = None;
        info!("Haptic player ended");
    }
}

impl Drop for HapticPlayer {
    fn drop(&mut self) {
        self.end();
    }
}

impl std::fmt::Debug for HapticPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapticPlayer")
            .field("entries", &self.playlist.len())
            .field("device", &self.device)
            .field("playables", &self.playables.len())
            .field("acquired", &self.acquired.len())
            .finish()
    }
}
