//! MPT Configuration Module
//!
//! This module provides the shared constants and the TOML-loadable
//! configuration types used across the trie workspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of a Keccak-256 / SHA-256 digest in bytes
pub const HASH_SIZE: usize = 32;
/// Number of child slots in a branch node (one per nibble value)
pub const BRANCH_WIDTH: usize = 16;
/// Number of items in an encoded branch node (children plus value slot)
pub const BRANCH_ITEM_COUNT: usize = BRANCH_WIDTH + 1;
/// Encodings at or above this length are stored under their hash instead of inlined
pub const INLINE_THRESHOLD: usize = 32;
/// Default hash algorithm name
pub const DEFAULT_HASH_ALGORITHM: &str = "KECCAK256";
/// Default capacity of the read cache used by the write-back store
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Backing store selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Volatile in-process map
    #[default]
    Memory,
    /// On-disk sled database at `path`
    Sled { path: PathBuf },
}

impl StoreConfig {
    /// Returns the backend name as written in configuration files.
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Sled { .. } => "sled",
        }
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreConfig::Memory => write!(f, "memory"),
            StoreConfig::Sled { path } => write!(f, "sled({})", path.display()),
        }
    }
}

/// Trie configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieConfig {
    /// Hash algorithm name, e.g. `KECCAK256` or `SHA256`
    pub hash_algorithm: String,
    /// Keep disposed nodes so every committed root stays resolvable
    pub keep_history: bool,
    /// Buffer writes until `flush`
    pub write_cache: bool,
    /// Read cache capacity of the write-back store
    pub cache_capacity: usize,
    pub store: StoreConfig,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM.to_string(),
            keep_history: false,
            write_cache: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            store: StoreConfig::default(),
        }
    }
}

impl TrieConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: TrieConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks values that serde cannot reject on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hash_algorithm.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "hash_algorithm must not be empty".to_string(),
            ));
        }
        if self.write_cache && self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache_capacity must be positive when write_cache is enabled".to_string(),
            ));
        }
        if let StoreConfig::Sled { path } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("sled path must not be empty".to_string()));
            }
        }
        Ok(())
    }
}
