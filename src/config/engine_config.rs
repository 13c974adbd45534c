//! Engine Configuration - business parameters as operator-tunable TOML values
//!
//! The Threshold Table, tick cadence, timeouts and budget rates are all
//! fields here. Each struct implements `Default` with the production values,
//! so a missing config file yields the standard small/medium/large policy.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::engine::BudgetRates;
use crate::types::{EnvironmentalRequirements, QualityStandards, TruckClassBand};

/// Environment variable naming a config file to load
pub const CONFIG_ENV_VAR: &str = "TENDER_ENGINE_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "tender_engine.toml";

/// Environment variable overriding `monitor.interval_secs`
pub const INTERVAL_ENV_VAR: &str = "TENDER_INTERVAL_SECS";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a tender engine deployment.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$TENDER_ENGINE_CONFIG`
/// 2. `./tender_engine.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tick cadence and external-call bounds
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Demand grouping
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// The Threshold Table, one entry per truck class
    #[serde(default = "TruckClassBand::default_table")]
    pub truck_classes: Vec<TruckClassBand>,

    /// Budget formula rates
    #[serde(default)]
    pub budget: BudgetRates,

    /// Requirement bundle attached to every automated tender
    #[serde(default)]
    pub requirements: RequirementsConfig,

    /// Local storage
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            clustering: ClusteringConfig::default(),
            truck_classes: TruckClassBand::default_table(),
            budget: BudgetRates::default(),
            requirements: RequirementsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TENDER_ENGINE_CONFIG` environment variable
    /// 2. `./tender_engine.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), bands = config.truck_classes.len(), "Loaded engine config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(bands = config.truck_classes.len(), "Loaded engine config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Two-pass: unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Engine config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    ///
    /// Range errors are fatal; suspicious-but-legal values are logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Tick interval, honouring the `TENDER_INTERVAL_SECS` override.
    pub fn tick_interval(&self) -> Duration {
        let secs = std::env::var(INTERVAL_ENV_VAR)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(self.monitor.interval_secs);
        Duration::from_secs(secs)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Monitor
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between ticks
    pub interval_secs: u64,
    /// Upper bound on each external call (seconds)
    pub call_timeout_secs: u64,
    /// Grace period for an in-flight tick on shutdown (seconds)
    pub shutdown_grace_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::TICK_INTERVAL_SECS,
            call_timeout_secs: defaults::EXTERNAL_CALL_TIMEOUT_SECS,
            shutdown_grace_secs: defaults::SHUTDOWN_GRACE_SECS,
        }
    }
}

impl MonitorConfig {
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

// ============================================================================
// Clustering
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Grouping radius (km). Unset means the smallest truck-class radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
}

// ============================================================================
// Requirements
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementsConfig {
    pub environmental: EnvironmentalRequirements,
    pub quality: QualityStandards,
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the sled database and the process lock
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
        }
    }
}
