//! Vendor library session: load plus `ts_initialize`, and the reverse.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use teslasuit_errors::ApiError;

use crate::loader::LibraryLoader;

/// Brings the vendor library up and down for the whole process.
#[derive(Debug)]
pub struct Core {
    loader: Arc<LibraryLoader>,
    initialized: AtomicBool,
}

impl Core {
    /// Wrap a loader. Nothing is loaded until [`initialize`](Self::initialize).
    pub fn new(loader: Arc<LibraryLoader>) -> Self {
        Self {
            loader,
            initialized: AtomicBool::new(false),
        }
    }

    /// The shared loader.
    pub fn loader(&self) -> &Arc<LibraryLoader> {
        &self.loader
    }

    /// Load the library and call `ts_initialize`.
    ///
    /// # Errors
    ///
    /// Returns the load failure, or the status of `ts_initialize`. The
    /// library stays loaded when only initialization fails so a retry does
    /// not reopen it.
    pub fn initialize(&self) -> Result<(), ApiError> {
        self.loader.load()?;
        let api = self.loader.require()?;
        api.initialize().inspect_err(|err| {
            tracing::error!(error = %err, "Vendor library initialization failed");
        })?;
        self.initialized.store(true, Ordering::Release);
        tracing::info!("Vendor library initialized");
        Ok(())
    }

    /// Call `ts_uninitialize` if initialized, then unload the library.
    pub fn uninitialize(&self) {
        if self.initialized.swap(false, Ordering::AcqRel) && self.loader.is_loaded() {
            if let Some(api) = self.loader.capabilities() {
                match api.uninitialize() {
                    Ok(()) => tracing::info!("Vendor library uninitialized"),
                    Err(err) => {
                        tracing::error!(error = %err, "Vendor library uninitialization failed");
                    }
                }
            }
        }
        self.loader.unload();
    }

    /// Whether `ts_initialize` succeeded and has not been undone.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}
