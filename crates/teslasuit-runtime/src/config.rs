//! Runtime configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use teslasuit_api::LoaderConfig;
use teslasuit_device::DiscoveryConfig;
use teslasuit_errors::ValidationError;
use tracing::debug;

/// Failure to read, parse or write a [`RuntimeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The contents are not a valid configuration.
    #[error("Failed to parse config file {path}: {reason}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The extension is neither YAML nor JSON.
    #[error("Unsupported config format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),

    /// The values parsed but are out of range.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// On-disk format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect the format of `path`, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Everything the runtime needs at startup.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// ```yaml
/// loader:
///   install_dir: /opt/teslasuit
/// discovery:
///   poll_interval_ms: 500
/// autostart_discovery: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Where to find the vendor library.
    pub loader: LoaderConfig,
    /// Discovery poller settings.
    pub discovery: DiscoveryConfig,
    /// Start diffing device lists as soon as the runtime is up.
    pub autostart_discovery: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            discovery: DiscoveryConfig::default(),
            autostart_discovery: true,
        }
    }
}

impl RuntimeConfig {
    /// Check every value that has a valid range.
    ///
    /// # Errors
    ///
    /// The first out-of-range discovery setting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.discovery.validate()
    }

    /// Parse YAML text and validate it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, ConfigFormat::Yaml, Path::new("<yaml>"))
    }

    /// Parse JSON text and validate it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, ConfigFormat::Json, Path::new("<json>"))
    }

    /// Load and validate a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedFormat`] for an unknown extension, otherwise
    /// a read, parse or validation failure.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, format, path)?;
        debug!(path = %path.display(), "Loaded runtime config");
        Ok(config)
    }

    /// Write the configuration in the format implied by the extension.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedFormat`], a serialization failure reported
    /// as [`ConfigError::Parse`], or a write failure.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let parse_err = |reason: String| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        let text = match format {
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| parse_err(e.to_string()))?,
            ConfigFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| parse_err(e.to_string()))?
            }
        };
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Saved runtime config");
        Ok(())
    }

    fn parse(text: &str, format: ConfigFormat, origin: &Path) -> Result<Self, ConfigError> {
        let parse_err = |reason: String| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason,
        };
        let config: Self = match format {
            // An empty YAML document is null, not an empty map.
            ConfigFormat::Yaml if text.trim().is_empty() => Self::default(),
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
            ConfigFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> Result<(), ConfigError> {
        let config = RuntimeConfig::from_yaml_str("discovery:\n  poll_interval_ms: 250\n")?;
        assert_eq!(config.discovery.poll_interval_ms, 250);
        assert_eq!(config.discovery.device_list_capacity, 8);
        assert!(config.autostart_discovery);
        assert_eq!(config.loader, LoaderConfig::default());
        Ok(())
    }

    #[test]
    fn test_empty_yaml_is_default() -> Result<(), ConfigError> {
        assert_eq!(RuntimeConfig::from_yaml_str("  \n")?, RuntimeConfig::default());
        Ok(())
    }

    #[test]
    fn test_out_of_range_json_is_invalid() {
        let result = RuntimeConfig::from_json_str(r#"{"discovery": {"poll_interval_ms": 1}}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = RuntimeConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
