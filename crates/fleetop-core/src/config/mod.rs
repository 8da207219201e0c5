//! Configuration parsing and management.
//!
//! Fleetop reads a small TOML configuration controlling reconciliation
//! behavior. All fields default to the legacy behavior of the source
//! platform, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reconcile::LookupPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetopConfig {
    /// Reconciliation behavior.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Reconciliation behavior knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// How instance records are matched to components. Defaults to the
    /// legacy first-match-on-device policy.
    #[serde(default)]
    pub lookup_policy: LookupPolicy,

    /// When set, operations targeting one device are serialized behind
    /// a per-device mutex for their whole duration, including the
    /// remote call. Off by default: concurrent operations on one device
    /// then race exactly as in the source platform.
    #[serde(default)]
    pub serialize_per_device: bool,
}

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl FleetopConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
