use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::crypto::SecretKey;
use crate::store::BatchId;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";

/// Tunables for a PodFS session.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Size in bytes of the blocks a file is split into on upload
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Cap on the number of owned pods
    #[serde(default = "default_max_pods")]
    pub max_pods: usize,
    /// Maximum pod name length, in characters
    #[serde(default = "default_max_pod_name_length")]
    pub max_pod_name_length: usize,
    /// Maximum file or directory name length, in characters
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Bound on a single store round trip
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How many blocks of one file may be in flight at once
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    /// Postage batch paying for uploads
    #[serde(default)]
    pub batch_id: BatchId,
}

fn default_block_size() -> usize {
    1024 * 1024
}

fn default_max_pods() -> usize {
    65535
}

fn default_max_pod_name_length() -> usize {
    64
}

fn default_max_name_length() -> usize {
    100
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_upload_concurrency() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            max_pods: default_max_pods(),
            max_pod_name_length: default_max_pod_name_length(),
            max_name_length: default_max_name_length(),
            request_timeout_ms: default_request_timeout_ms(),
            upload_concurrency: default_upload_concurrency(),
            batch_id: BatchId::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_toml = fs::read_to_string(path)?;
        Self::from_toml_str(&config_toml)
    }

    /// Write this config to disk as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config_toml = toml::to_string_pretty(self)?;
        fs::write(path, config_toml)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be positive".into()));
        }
        if self.upload_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "upload_concurrency must be positive".into(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Load a root identity from a PEM file
pub fn load_key(path: &Path) -> Result<SecretKey, ConfigError> {
    let pem = fs::read_to_string(path)?;
    let key = SecretKey::from_pem(&pem).map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
    Ok(key)
}

/// Persist a root identity as a PEM file
pub fn save_key(path: &Path, key: &SecretKey) -> Result<(), ConfigError> {
    fs::write(path, key.to_pem())?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
