//! Load and unload lifecycle of the vendor library.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use teslasuit_errors::ApiError;

use crate::config::LoaderConfig;
use crate::native::NativeApi;
use crate::platform;
use crate::vendor::VendorApi;

/// Opens a library file and produces its capability table.
pub trait LibraryOpener: Send + Sync {
    /// Open the library at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LibraryLoad`] when the file cannot be opened.
    fn open(&self, path: &Path) -> Result<Arc<dyn VendorApi>, ApiError>;
}

/// [`LibraryOpener`] for the real vendor library.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

impl LibraryOpener for NativeOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn VendorApi>, ApiError> {
        if let Some(dir) = path.parent() {
            platform::add_library_search_dir(dir);
        }
        let library = platform::open_library(path)?;
        Ok(Arc::new(NativeApi::from_library(library)))
    }
}

/// Result of a successful [`LibraryLoader::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The library was opened by this call.
    Loaded,
    /// The library was already open; nothing was done.
    AlreadyLoaded,
}

/// Owns the vendor library for the process.
///
/// `load` and `unload` are idempotent. The capability table handed out by
/// [`capabilities`](Self::capabilities) keeps the library mapped for as long
/// as the caller holds it, so unloading never leaves dangling entry points;
/// it only stops new callers from obtaining the table.
pub struct LibraryLoader {
    config: LoaderConfig,
    opener: Box<dyn LibraryOpener>,
    api: RwLock<Option<Arc<dyn VendorApi>>>,
    load_cycles: AtomicU64,
}

impl LibraryLoader {
    /// Create an unloaded loader for the real vendor library.
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_opener(config, NativeOpener)
    }

    /// Create an unloaded loader with a custom opener.
    pub fn with_opener(config: LoaderConfig, opener: impl LibraryOpener + 'static) -> Self {
        Self {
            config,
            opener: Box::new(opener),
            api: RwLock::new(None),
            load_cycles: AtomicU64::new(0),
        }
    }

    /// Loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Open the library if it is not open yet.
    ///
    /// On failure the loader stays unloaded and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoLibraryDirectory`] when no install directory is
    /// configured, or [`ApiError::LibraryLoad`] when opening fails.
    pub fn load(&self) -> Result<LoadOutcome, ApiError> {
        let mut api = self.api.write();
        if api.is_some() {
            tracing::info!("Vendor library already loaded");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let path = self.config.library_path().inspect_err(|err| {
            tracing::error!(error = %err, "Cannot locate vendor library");
        })?;
        let opened = self.opener.open(&path).inspect_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "Failed to load vendor library");
        })?;

        *api = Some(opened);
        let cycle = self.load_cycles.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(path = %path.display(), cycle, "Vendor library loaded");
        Ok(LoadOutcome::Loaded)
    }

    /// Release the library. Returns whether anything was unloaded.
    pub fn unload(&self) -> bool {
        match self.api.write().take() {
            Some(_) => {
                tracing::info!("Vendor library unloaded");
                true
            }
            None => {
                tracing::debug!("Vendor library not loaded; unload is a no-op");
                false
            }
        }
    }

    /// Whether the library is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.api.read().is_some()
    }

    /// Capability table of the current load cycle.
    ///
    /// Returns `None` with a warning while unloaded; callers must treat that
    /// as "capability unavailable" and fail their own operation.
    pub fn capabilities(&self) -> Option<Arc<dyn VendorApi>> {
        let api = self.api.read().clone();
        if api.is_none() {
            tracing::warn!("Vendor library handle requested while unloaded");
        }
        api
    }

    /// Like [`capabilities`](Self::capabilities), as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotLoaded`] while unloaded.
    pub fn require(&self) -> Result<Arc<dyn VendorApi>, ApiError> {
        self.capabilities().ok_or(ApiError::NotLoaded)
    }

    /// Number of successful loads so far.
    pub fn load_cycles(&self) -> u64 {
        self.load_cycles.load(Ordering::Acquire)
    }
}

impl Drop for LibraryLoader {
    fn drop(&mut self) {
        if self.api.get_mut().take().is_some() {
            tracing::info!("Vendor library unloaded on drop");
        }
    }
}

impl std::fmt::Debug for LibraryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryLoader")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .field("load_cycles", &self.load_cycles())
            .finish_non_exhaustive()
    }
}
