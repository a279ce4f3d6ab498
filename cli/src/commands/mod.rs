//! Subcommand implementations.

pub mod config;
pub mod kill;
pub mod probe;
pub mod run;
pub mod stop;
pub mod wait;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use portwarden_core::{Config, ConfigStore, HttpProbe, PortReaper, ServerConfig, ServerLifecycle};

use crate::TimingArgs;

/// Everything a command needs: the loaded config file and output mode.
pub struct Context {
    pub store: ConfigStore,
    pub config: Config,
    pub json: bool,
}

impl Context {
    /// Load the config file at `path`, or the default location.
    pub async fn load(path: Option<PathBuf>, json: bool) -> Result<Self> {
        let store = match path {
            Some(path) => ConfigStore::with_path(path),
            None => ConfigStore::new()?,
        };
        let config = store
            .load()
            .await
            .with_context(|| format!("loading {}", store.path().display()))?;

        Ok(Self { store, config, json })
    }

    /// Lifecycle service using the configured reaper.
    pub fn lifecycle(&self) -> ServerLifecycle<PortReaper, HttpProbe> {
        ServerLifecycle::new(
            PortReaper::with_options(self.config.reaper.clone()),
            HttpProbe::new(),
        )
    }

    /// Config-file server settings with command-line flags layered on top.
    pub fn server_config(&self, port: Option<u16>, timing: &TimingArgs) -> ServerConfig {
        let mut flags = ServerConfig::new();
        flags.port = port;
        flags.host = timing.host.clone();
        flags.timeout_ms = timing.timeout;
        flags.poll_interval_ms = timing.poll_interval;
        flags.spawn = self.config.server.spawn.clone();

        self.config.server.merged_with(&flags)
    }
}

pub fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
