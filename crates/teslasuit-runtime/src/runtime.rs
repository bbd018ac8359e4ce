//! Process-wide bring-up and tear-down of the bridge.

use std::sync::Arc;

use teslasuit_api::{Core, LibraryLoader};
use teslasuit_device::{DeviceProvider, DeviceSlotManager, SlotIndex};
use teslasuit_errors::{ApiError, TeslasuitError};
use teslasuit_haptics::{HapticAsset, HapticAssetManager, HapticPlayer};
use teslasuit_streaming::{MocapStream, PpgStream};
use tracing::{error, info};

use crate::config::RuntimeConfig;

/// Owns the vendor session, discovery, slot bindings and the haptic cache.
///
/// Startup runs in dependency order: vendor initialize, provider, haptic
/// manager, slot manager, then discovery. Shutdown reverses it: haptic
/// playables and assets are released while the library is still loaded,
/// discovery stops and closes every handle, and only then is the vendor
/// library uninitialized and unloaded.
pub struct TeslasuitRuntime {
    config: RuntimeConfig,
    core: Core,
    provider: Option<DeviceProvider>,
    slots: DeviceSlotManager,
    haptics: Arc<HapticAssetManager>,
    shut_down: bool,
}

impl TeslasuitRuntime {
    /// Start the runtime with the native library opener.
    ///
    /// # Errors
    ///
    /// See [`startup_with_loader`](Self::startup_with_loader).
    pub fn startup(config: RuntimeConfig) -> Result<Self, TeslasuitError> {
        let loader = Arc::new(LibraryLoader::new(config.loader.clone()));
        Self::startup_with_loader(loader, config)
    }

    /// Start the runtime over an existing loader.
    ///
    /// `config.loader` is ignored in favor of the loader's own configuration.
    ///
    /// # Errors
    ///
    /// A validation error for bad discovery settings, the load or
    /// initialization failure of the vendor library, or a discovery thread
    /// spawn failure. The library is unloaded again on any failure.
    pub fn startup_with_loader(
        loader: Arc<LibraryLoader>,
        config: RuntimeConfig,
    ) -> Result<Self, TeslasuitError> {
        config.validate()?;

        let core = Core::new(loader);
        if let Err(err) = core.initialize() {
            core.uninitialize();
            return Err(err.into());
        }

        let provider = match DeviceProvider::new(Arc::clone(core.loader()), config.discovery) {
            Ok(provider) => provider,
            Err(err) => {
                error!(error = %err, "Failed to create device provider");
                core.uninitialize();
                return Err(err);
            }
        };
        let haptics = Arc::new(HapticAssetManager::new(Arc::clone(core.loader())));
        let slots = DeviceSlotManager::new();
        slots.initialize(&provider);

        if config.autostart_discovery {
            provider.start();
        }
        info!(
            autostart_discovery = config.autostart_discovery,
            "Teslasuit runtime started"
        );

        Ok(Self {
            config,
            core,
            provider: Some(provider),
            slots,
            haptics,
            shut_down: false,
        })
    }

    /// The configuration the runtime was started with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The shared library loader.
    pub fn loader(&self) -> &Arc<LibraryLoader> {
        self.core.loader()
    }

    /// The vendor session.
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// The discovery poller, `None` after shutdown.
    pub fn provider(&self) -> Option<&DeviceProvider> {
        self.provider.as_ref()
    }

    /// Slot bindings of discovered devices.
    pub fn slots(&self) -> &DeviceSlotManager {
        &self.slots
    }

    /// The shared haptic asset cache.
    pub fn haptics(&self) -> &Arc<HapticAssetManager> {
        &self.haptics
    }

    /// Poll once and deliver the resulting events on the calling thread.
    ///
    /// Returns the number of events delivered.
    pub fn refresh_devices(&self) -> usize {
        self.provider.as_ref().map_or(0, |provider| {
            provider.poll_now();
            provider.dispatch_pending()
        })
    }

    /// Deliver events the background poller queued since the last call.
    pub fn dispatch_pending(&self) -> usize {
        self.provider
            .as_ref()
            .map_or(0, DeviceProvider::dispatch_pending)
    }

    /// A player for `playlist` attached to the device in `slot`, if any.
    pub fn haptic_player(&self, playlist: Vec<HapticAsset>, slot: SlotIndex) -> HapticPlayer {
        let mut player = HapticPlayer::new(Arc::clone(&self.haptics), playlist);
        player.set_device(self.slots.device_handle(slot));
        player
    }

    /// A mocap stream on the current capability table.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotLoaded`] after shutdown.
    pub fn mocap_stream(&self) -> Result<MocapStream, ApiError> {
        MocapStream::from_loader(self.loader())
    }

    /// A PPG stream on the current capability table.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotLoaded`] after shutdown.
    pub fn ppg_stream(&self) -> Result<PpgStream, ApiError> {
        PpgStream::from_loader(self.loader())
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Release everything in reverse startup order. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.haptics.shutdown();
        self.slots.uninitialize();
        if let Some(provider) = self.provider.take() {
            provider.stop();
            drop(provider);
        }
        self.core.uninitialize();
        info!("Teslasuit runtime shut down");
    }
}

impl Drop for TeslasuitRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TeslasuitRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeslasuitRuntime")
            .field("initialized", &self.core.is_initialized())
            .field("discovery_running", &self.provider.as_ref().map(DeviceProvider::is_running))
            .field("connected_slots", &self.slots.connected_slots())
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}
