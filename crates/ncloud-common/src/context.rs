//! Provider session context.
//!
//! A [`ProviderContext`] is built once per provider session from a
//! validated [`ProviderConfig`] and is read-only afterwards. Every gateway
//! and controller call takes it explicitly. Clones share the same
//! configuration; the session ends when the last clone is dropped.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ProviderConfig, TimeoutConfig, WaitConfig};
use crate::error::NcloudResult;

/// Remote API shape serving a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendFlavor {
    /// Legacy flat API (region numbers, integer ids).
    Classic,
    /// Network-scoped API (region codes).
    Vpc,
}

impl BackendFlavor {
    /// Returns the flavor name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendFlavor::Classic => "classic",
            BackendFlavor::Vpc => "vpc",
        }
    }
}

impl fmt::Display for BackendFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only session state shared by all operations.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    inner: Arc<ProviderConfig>,
}

impl ProviderContext {
    /// Validates `config` and starts a session.
    pub fn new(config: ProviderConfig) -> NcloudResult<Self> {
        config.validate()?;
        tracing::info!(
            flavor = %flavor_of(&config),
            region_code = %config.region.code,
            region_no = %config.region.no,
            "Provider context initialized"
        );
        Ok(Self {
            inner: Arc::new(config),
        })
    }

    /// Returns the backend flavor selected for this session.
    pub fn flavor(&self) -> BackendFlavor {
        flavor_of(&self.inner)
    }

    /// Region code (VPC backend).
    pub fn region_code(&self) -> &str {
        &self.inner.region.code
    }

    /// Region number (Classic backend).
    pub fn region_no(&self) -> &str {
        &self.inner.region.no
    }

    /// Per-operation timeouts.
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.inner.timeouts
    }

    /// Wait loop tuning.
    pub fn wait_settings(&self) -> &WaitConfig {
        &self.inner.wait
    }

    /// The configuration this session was built from.
    pub fn config(&self) -> &ProviderConfig {
        &self.inner
    }
}

fn flavor_of(config: &ProviderConfig) -> BackendFlavor {
    if config.support_vpc {
        BackendFlavor::Vpc
    } else {
        BackendFlavor::Classic
    }
}
