use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

mod node;
mod trie;

pub use node::NodeConfig;
pub use trie::TrieConfig;

/// Errors raised while reading or writing configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the file
    #[error("config io error: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid configuration
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as toml
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Node configuration
    #[serde(default)]
    pub node: NodeConfig,

    /// State trie configuration
    #[serde(default)]
    pub trie: TrieConfig,
}

impl Config {
    /// Parse configuration from a toml string
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml(&config_str)
    }

    /// Render configuration as toml
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Generate a default configuration file if it doesn't exist
    pub fn generate_default<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if path.exists() {
            info!("Config file already exists at {:?}", path);
            return Ok(());
        }

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        Config::default().save(path)?;

        info!("Generated default config at {:?}", path);
        Ok(())
    }
}
