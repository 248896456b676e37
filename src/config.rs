//! Driver configuration.
//!
//! One immutable [`DriverConfig`] is deserialized at startup and passed by
//! reference (or cloned) into each backend; nothing here is mutated after
//! load.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration for the systems driver layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Backend to register as the default.
    pub backend: BackendKind,
    /// Hyper-V backend configuration.
    pub hyperv: HyperVConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Mock,
            hyperv: HyperVConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: DriverConfig =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse config file")?;

        Ok(config)
    }
}

/// Backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory mock backend for testing/development.
    Mock,
    /// Hyper-V backend.
    HyperV,
}

/// Hyper-V backend configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HyperVConfig {
    /// Management endpoint tag, used in log and error context.
    pub host: String,
}

impl Default for HyperVConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
        }
    }
}
