//! Provider configuration.
//!
//! Loaded from a TOML file; every field has a default, so an empty file is
//! a valid configuration.
//!
//! ```toml
//! support_vpc = true
//!
//! [region]
//! code = "KR"
//! no = "1"
//!
//! [timeouts]
//! create_secs = 3600
//! update_secs = 3600
//! delete_secs = 300
//!
//! [wait]
//! initial_delay_ms = 2000
//! min_interval_ms = 3000
//! max_interval_ms = 10000
//! unexpected_state = "retry"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NcloudError, NcloudResult};
use crate::wait::UnexpectedStatePolicy;

/// Region selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region code used by the VPC backend (e.g., "KR")
    #[serde(default = "default_region_code")]
    pub code: String,

    /// Region number used by the Classic backend (e.g., "1")
    #[serde(default = "default_region_no")]
    pub no: String,
}

/// Per-operation timeouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Create (and activation wait) timeout in seconds
    #[serde(default = "default_create_timeout")]
    pub create_secs: u64,

    /// Update timeout in seconds
    #[serde(default = "default_update_timeout")]
    pub update_secs: u64,

    /// Delete (and deletion wait) timeout in seconds
    #[serde(default = "default_delete_timeout")]
    pub delete_secs: u64,
}

/// Polling behaviour of wait loops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Delay before the first refresh in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Minimum interval between refreshes in milliseconds
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,

    /// Maximum interval between refreshes in milliseconds
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,

    /// What to do with a refresh state that is neither pending nor target
    #[serde(default)]
    pub unexpected_state: UnexpectedStatePolicy,
}

/// Complete provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Use the VPC (network-scoped) backend instead of Classic
    #[serde(default = "default_support_vpc")]
    pub support_vpc: bool,

    /// Region selection
    #[serde(default)]
    pub region: RegionConfig,

    /// Per-operation timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Wait loop tuning
    #[serde(default)]
    pub wait: WaitConfig,
}

// Default functions
fn default_region_code() -> String {
    "KR".to_string()
}

fn default_region_no() -> String {
    "1".to_string()
}

fn default_create_timeout() -> u64 {
    3600
}

fn default_update_timeout() -> u64 {
    3600
}

fn default_delete_timeout() -> u64 {
    300
}

fn default_initial_delay() -> u64 {
    2000
}

fn default_min_interval() -> u64 {
    3000
}

fn default_max_interval() -> u64 {
    10000
}

fn default_support_vpc() -> bool {
    true
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            code: default_region_code(),
            no: default_region_no(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            create_secs: default_create_timeout(),
            update_secs: default_update_timeout(),
            delete_secs: default_delete_timeout(),
        }
    }
}

impl TimeoutConfig {
    /// Create timeout.
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    /// Update timeout.
    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    /// Delete timeout.
    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            min_interval_ms: default_min_interval(),
            max_interval_ms: default_max_interval(),
            unexpected_state: UnexpectedStatePolicy::default(),
        }
    }
}

impl WaitConfig {
    /// Delay before the first refresh.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Minimum interval between refreshes.
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Maximum interval between refreshes.
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            support_vpc: default_support_vpc(),
            region: RegionConfig::default(),
            timeouts: TimeoutConfig::default(),
            wait: WaitConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> NcloudResult<Self> {
        let config: ProviderConfig = toml::from_str(content)
            .map_err(|e| NcloudError::invalid_config("toml", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> NcloudResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            NcloudError::invalid_config("path", format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> NcloudResult<()> {
        if self.support_vpc && self.region.code.is_empty() {
            return Err(NcloudError::invalid_config(
                "region.code",
                "region code is required for the VPC backend",
            ));
        }

        if !self.support_vpc && self.region.no.is_empty() {
            return Err(NcloudError::invalid_config(
                "region.no",
                "region number is required for the Classic backend",
            ));
        }

        for (field, secs) in [
            ("timeouts.create_secs", self.timeouts.create_secs),
            ("timeouts.update_secs", self.timeouts.update_secs),
            ("timeouts.delete_secs", self.timeouts.delete_secs),
        ] {
            if secs == 0 {
                return Err(NcloudError::invalid_config(field, "must be greater than 0"));
            }
        }

        if self.wait.min_interval_ms == 0 {
            return Err(NcloudError::invalid_config(
                "wait.min_interval_ms",
                "must be greater than 0",
            ));
        }

        if self.wait.min_interval_ms > self.wait.max_interval_ms {
            return Err(NcloudError::invalid_config(
                "wait.max_interval_ms",
                format!(
                    "must not be below wait.min_interval_ms ({})",
                    self.wait.min_interval_ms
                ),
            ));
        }

        Ok(())
    }
}
