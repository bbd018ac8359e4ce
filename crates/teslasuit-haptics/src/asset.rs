//! In-memory haptic assets.

use core::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use teslasuit_errors::HapticError;
use tracing::info;

/// File extension of exported haptic assets.
pub const ASSET_EXTENSION: &str = "ts_asset";

static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`HapticAsset`].
///
/// Allocated once per asset at construction; clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(u64);

impl AssetId {
    fn next() -> Self {
        Self(NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identity value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// An exported haptic asset blob.
///
/// The bytes are opaque to the bridge and handed to the vendor library
/// unchanged.
#[derive(Debug, Clone)]
pub struct HapticAsset {
    id: AssetId,
    name: String,
    data: Arc<[u8]>,
}

impl HapticAsset {
    /// Wrap raw asset bytes.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let asset = Self {
            id: AssetId::next(),
            name: name.into(),
            data: Arc::from(data.into()),
        };
        info!(asset = %asset.id, name = %asset.name, size = asset.data.len(), "Haptic asset initialized");
        asset
    }

    /// Read an asset file. The file stem becomes the asset name.
    ///
    /// # Errors
    ///
    /// Returns [`HapticError::AssetRead`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HapticError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| HapticError::AssetRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, data))
    }

    /// Stable identity used as the cache key.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw asset bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the asset holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_shared_by_clones() {
        let a = HapticAsset::new("a", vec![1, 2, 3]);
        let b = HapticAsset::new("b", vec![1, 2, 3]);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let result = HapticAsset::from_file("/definitely/not/here.ts_asset");
        assert!(matches!(
            result,
            Err(HapticError::AssetRead { ref path, .. }) if path.ends_with("here.ts_asset")
        ));
    }
}
