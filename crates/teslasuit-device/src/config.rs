//! Discovery configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use teslasuit_errors::ValidationError;

const POLL_INTERVAL_RANGE_MS: (u64, u64) = (10, 60_000);
const CAPACITY_RANGE: (usize, usize) = (1, 64);

/// Discovery poller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Time between enumeration ticks in milliseconds.
    ///
    /// Default: 1000.
    pub poll_interval_ms: u64,

    /// Number of descriptors the enumeration buffer holds.
    ///
    /// Default: 8.
    pub device_list_capacity: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            device_list_capacity: 8,
        }
    }
}

impl DiscoveryConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> DiscoveryConfigBuilder {
        DiscoveryConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] for a poll interval outside
    /// 10..=60000 ms or a capacity outside 1..=64.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (min, max) = POLL_INTERVAL_RANGE_MS;
        if !(min..=max).contains(&self.poll_interval_ms) {
            return Err(ValidationError::out_of_range(
                "poll_interval_ms",
                self.poll_interval_ms,
                min,
                max,
            ));
        }
        let (min, max) = CAPACITY_RANGE;
        if !(min..=max).contains(&self.device_list_capacity) {
            return Err(ValidationError::out_of_range(
                "device_list_capacity",
                self.device_list_capacity,
                min,
                max,
            ));
        }
        Ok(())
    }

    /// Poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Builder for [`DiscoveryConfig`].
#[derive(Debug, Default)]
pub struct DiscoveryConfigBuilder {
    config: DiscoveryConfig,
}

impl DiscoveryConfigBuilder {
    /// Set the poll interval in milliseconds.
    #[must_use]
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the enumeration buffer capacity.
    #[must_use]
    pub fn device_list_capacity(mut self, capacity: usize) -> Self {
        self.config.device_list_capacity = capacity;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<DiscoveryConfig, ValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.device_list_capacity, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validates() {
        assert!(DiscoveryConfig::builder().poll_interval_ms(5).build().is_err());
        assert!(DiscoveryConfig::builder().device_list_capacity(0).build().is_err());
        assert!(DiscoveryConfig::builder().device_list_capacity(65).build().is_err());

        let config = DiscoveryConfig::builder()
            .poll_interval_ms(50)
            .device_list_capacity(2)
            .build();
        assert_eq!(
            config,
            Ok(DiscoveryConfig {
                poll_interval_ms: 50,
                device_list_capacity: 2
            })
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<(), serde_json::Error> {
        let config: DiscoveryConfig = serde_json::from_str(r#"{"poll_interval_ms": 250}"#)?;
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.device_list_capacity, 8);
        Ok(())
    }
}
