//! Engine configuration
//!
//! Tuning knobs for the transport: resync cadence, fade length, the
//! common start lead, and how often the now-playing surface is refreshed
//! while playing. Stored as YAML; a missing or malformed file falls back
//! to defaults with a warning rather than failing startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Transport timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Drift-correction tick interval in milliseconds
    pub resync_interval_ms: u64,
    /// Length of a volume fade in milliseconds
    pub fade_ms: u64,
    /// How far in the future all stems are started so they begin in
    /// lock-step, in milliseconds
    pub start_lead_ms: u64,
    /// Minimum interval between now-playing refreshes while playing,
    /// in milliseconds (transport edges always publish immediately)
    pub nowplaying_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resync_interval_ms: 1,
            fade_ms: 500,
            start_lead_ms: 100,
            nowplaying_interval_ms: 1_000,
        }
    }
}

impl EngineConfig {
    pub fn resync_interval(&self) -> Duration {
        Duration::from_millis(self.resync_interval_ms.max(1))
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn start_lead(&self) -> Duration {
        Duration::from_millis(self.start_lead_ms)
    }

    pub fn nowplaying_interval(&self) -> Duration {
        Duration::from_millis(self.nowplaying_interval_ms)
    }
}

/// Default location of the engine config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slipstream")
        .join("engine.yaml")
}

/// Load a YAML configuration file
///
/// A missing file yields defaults silently; an unreadable or malformed
/// file yields defaults with a warning. Startup never fails on config.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("config {:?} not found, using defaults", path);
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<T>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to parse {:?}: {}, using defaults", path, e);
                T::default()
            }
        },
        Err(e) => {
            log::warn!("failed to read {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save a configuration as YAML, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))
}
