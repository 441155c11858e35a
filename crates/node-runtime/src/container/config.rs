//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Values come from (lowest to highest precedence) the built-in defaults, an
//! optional JSON file named by `POV_CONFIG`, and the `POV_LOG_LEVEL` /
//! `POV_MIN_SYNC_PEERS` environment variables.

use crate::genesis::GenesisConfig;
use pov_02_block_processor::ProcessorConfig;
use pov_03_peer_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "POV_CONFIG";
/// Environment override for `logging.level`.
pub const LOG_LEVEL_ENV: &str = "POV_LOG_LEVEL";
/// Environment override for `sync.min_sync_peers`.
pub const MIN_SYNC_PEERS_ENV: &str = "POV_MIN_SYNC_PEERS";

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Block processor configuration.
    pub processor: ProcessorConfig,
    /// Peer syncer configuration.
    pub sync: SyncConfig,
    /// Block verifier configuration.
    pub verifier: VerifierConfig,
    /// Genesis block configuration.
    pub genesis: GenesisConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Capacity of the shared event bus.
    pub bus_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::default(),
            sync: SyncConfig::default(),
            verifier: VerifierConfig::default(),
            genesis: GenesisConfig::default(),
            logging: LoggingConfig::default(),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl NodeConfig {
    /// Short timers and small pools for tests.
    pub fn for_testing() -> Self {
        Self {
            processor: ProcessorConfig::for_testing(),
            sync: SyncConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid("bus_capacity must be non-zero".into()));
        }
        if self.processor.max_orphan_blocks == 0 || self.processor.max_pending_blocks == 0 {
            return Err(ConfigError::Invalid(
                "processor pool capacities must be non-zero".into(),
            ));
        }
        if self.sync.max_blocks_per_request == 0 {
            return Err(ConfigError::Invalid(
                "sync.max_blocks_per_request must be non-zero".into(),
            ));
        }
        self.genesis
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Block verifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// How far a block timestamp may run ahead of the local clock.
    pub max_future_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self { max_future_secs: 15 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `pov_03_peer_sync=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    pub thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            thread_ids: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    load_config_with(|name| std::env::var(name).ok())
}

/// Load configuration using `env` to look up variables.
pub fn load_config_with<F>(env: F) -> Result<NodeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match env(CONFIG_PATH_ENV) {
        Some(path) => read_config_file(Path::new(&path))?,
        None => NodeConfig::default(),
    };

    if let Some(level) = env(LOG_LEVEL_ENV) {
        config.logging.level = level;
    }

    if let Some(value) = env(MIN_SYNC_PEERS_ENV) {
        config.sync.min_sync_peers = value.parse().map_err(|_| ConfigError::InvalidEnv {
            name: MIN_SYNC_PEERS_ENV,
            value,
        })?;
    }

    config.validate()?;
    Ok(config)
}

/// Parse a JSON config file. Missing fields keep their defaults.
pub fn read_config_file(path: &Path) -> Result<NodeConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
