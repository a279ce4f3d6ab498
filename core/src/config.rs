//! Configuration management for server and reaper defaults.
//!
//! Stores configuration in JSON format at `~/.portwarden/config.json`.
//! Values in the file sit between the built-in defaults and whatever a
//! caller passes explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{ReaperOptions, ServerConfig};
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Defaults for start, wait and stop calls.
    #[serde(default)]
    pub server: ServerConfig,

    /// How ports are freed.
    #[serde(default)]
    pub reaper: ReaperOptions,
}

/// Configuration store for reading and writing the config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portwarden/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portwarden").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self.config_dir();
        fs::create_dir_all(&config_dir)
            .await
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write to a temp file then rename so readers never see a partial file.
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Get the server defaults.
    pub async fn get_server(&self) -> Result<ServerConfig> {
        Ok(self.load().await?.server)
    }

    /// Replace the server defaults.
    pub async fn set_server(&self, server: ServerConfig) -> Result<()> {
        let mut config = self.load().await?;
        config.server = server;
        self.save(&config).await
    }

    /// Get the reaper options.
    pub async fn get_reaper(&self) -> Result<ReaperOptions> {
        Ok(self.load().await?.reaper)
    }

    /// Replace the reaper options.
    pub async fn set_reaper(&self, reaper: ReaperOptions) -> Result<()> {
        let mut config = self.load().await?;
        config.reaper = reaper;
        self.save(&config).await
    }
}
