//! Where to find the vendor library.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use teslasuit_errors::ApiError;

use crate::platform;

/// Environment variable naming the vendor install directory.
pub const INSTALL_DIR_ENV: &str = "TESLASUIT_INSTALL_DIR";

/// Library loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Explicit install directory; takes precedence over the environment.
    pub install_dir: Option<PathBuf>,
    /// Environment variable consulted when `install_dir` is unset.
    pub install_dir_env: String,
    /// Library file name; the platform default when unset.
    pub library_name: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            install_dir: None,
            install_dir_env: INSTALL_DIR_ENV.to_string(),
            library_name: None,
        }
    }
}

impl LoaderConfig {
    /// Configuration pinned to an explicit install directory.
    pub fn with_install_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// The library file name to open.
    pub fn library_name(&self) -> &str {
        self.library_name
            .as_deref()
            .unwrap_or(platform::default_library_name())
    }

    /// The install directory: the explicit override, else the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoLibraryDirectory`] when neither is set or the
    /// environment value is empty.
    pub fn resolve_install_dir(&self) -> Result<PathBuf, ApiError> {
        if let Some(dir) = self.install_dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            return Ok(dir.clone());
        }
        std::env::var_os(&self.install_dir_env)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ApiError::NoLibraryDirectory {
                env_var: self.install_dir_env.clone(),
            })
    }

    /// Full path of the library file.
    ///
    /// # Errors
    ///
    /// See [`resolve_install_dir`](Self::resolve_install_dir).
    pub fn library_path(&self) -> Result<PathBuf, ApiError> {
        Ok(self.resolve_install_dir()?.join(self.library_name()))
    }
}
