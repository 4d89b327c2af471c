//! Node configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use distro_core::{EmissionParams, ParamsError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid emission params: {0}")]
    Params(#[from] ParamsError),

    #[error("invalid logging config: {0}")]
    Logging(String),
}

/// Complete node configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node operation settings
    #[serde(default)]
    pub node: NodeSettings,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Emission parameters used until genesis replaces them
    #[serde(default)]
    pub emission: EmissionParams,
}

impl NodeConfig {
    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section; returns the validated emission snapshot
    pub fn validate(&self) -> Result<EmissionParams, ConfigError> {
        self.logging.validate()?;
        self.emission.validate()?;
        Ok(self.emission.clone())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.node.data_dir)
    }

    /// Path of the snapshot holding module entries and node state
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.store_file)
    }
}

/// Basic node settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Node name
    #[serde(default = "default_node_name")]
    pub name: String,

    /// Data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_node_name() -> String {
    "distro-node".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            data_dir: default_data_dir(),
        }
    }
}

/// Storage configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file, relative to the data directory
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

fn default_store_file() -> String {
    "store.bin".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_file: default_store_file(),
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| ConfigError::Logging(format!("level '{}': {}", self.level, e)))
    }
}
