//! Library opener that hands out a [`MockVendorApi`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use teslasuit_api::{LibraryLoader, LibraryOpener, LoaderConfig, VendorApi};
use teslasuit_errors::ApiError;

use crate::mock::MockVendorApi;

/// Install directory used by [`mock_loader`].
pub const MOCK_INSTALL_DIR: &str = "/mock/teslasuit";

/// Counts opens and can be told to fail. Clones share their counters, so a
/// test can keep one clone and give another to the loader.
#[derive(Clone)]
pub struct MockLibraryOpener {
    api: Arc<MockVendorApi>,
    opens: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockLibraryOpener {
    /// Opener that yields `api` on every successful open.
    pub fn new(api: Arc<MockVendorApi>) -> Self {
        Self {
            api,
            opens: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
            paths: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of open attempts, successful or not.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Make subsequent opens fail with [`ApiError::LibraryLoad`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Paths passed to `open`, oldest first.
    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }
}

impl LibraryOpener for MockLibraryOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn VendorApi>, ApiError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().push(path.to_path_buf());
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::library_load(path, "mock open failure"));
        }
        Ok(self.api.clone())
    }
}

/// Unloaded loader over `api`, pinned to [`MOCK_INSTALL_DIR`].
pub fn mock_loader(api: Arc<MockVendorApi>) -> (Arc<LibraryLoader>, MockLibraryOpener) {
    let opener = MockLibraryOpener::new(api);
    let loader = LibraryLoader::with_opener(
        LoaderConfig::with_install_dir(MOCK_INSTALL_DIR),
        opener.clone(),
    );
    (Arc::new(loader), opener)
}

/// Like [`mock_loader`], already loaded.
pub fn loaded_mock_loader(api: Arc<MockVendorApi>) -> Arc<LibraryLoader> {
    let (loader, _) = mock_loader(api);
    if let Err(err) = loader.load() {
        panic!("mock loader failed to load: {err}");
    }
    loader
}
