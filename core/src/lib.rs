//! Portwarden Core Library
//!
//! Small helpers for development and test tooling:
//! - Free a TCP port by killing whatever listens on it
//! - Probe a local HTTP server for readiness (`GET /` answering `200`)
//! - Start a server command detached, wait for it, and stop it again
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Plain configuration types
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Reaper, probe and spawner implementations
//! - `application`: The server lifecycle service
//!
//! The free functions at the crate root wire the default adapters together.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::{HttpProbe, PortReaper, ProcessHandle};
pub use application::ServerLifecycle;
pub use config::{Config, ConfigStore};
pub use domain::{PollSettings, ReaperOptions, ReaperStrategy, ServerConfig, SpawnOptions};
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lifecycle service using `npx kill-port` and the HTTP probe.
pub fn default_lifecycle() -> ServerLifecycle<PortReaper, HttpProbe> {
    ServerLifecycle::new(PortReaper::new(), HttpProbe::new())
}

/// Kill whatever process is bound to `port`. Never fails.
pub async fn kill_process_on_port(port: u16, options: &ReaperOptions) {
    PortReaper::with_options(options.clone())
        .kill_process_on_port(port)
        .await
}

/// Whether `host:port` answers `GET /` with `200` within two seconds.
pub async fn is_server_running(port: u16, host: &str) -> bool {
    HttpProbe::new().is_server_running(port, host).await
}

/// Free the configured port and wait until it stops answering.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use portwarden_core::{stop_server, ServerConfig};
///
/// # async fn example() -> portwarden_core::Result<()> {
/// let config = ServerConfig::new()
///     .with_port(9999)
///     .with_timeout(Duration::from_millis(1000))
///     .with_poll_interval(Duration::from_millis(100));
/// assert!(stop_server(&config).await?);
/// # Ok(())
/// # }
/// ```
pub async fn stop_server(config: &ServerConfig) -> Result<bool> {
    default_lifecycle().stop(config).await
}

/// Spawn `command` detached and return immediately.
///
/// When `on_ready` is given it runs once the configured port answers; a
/// readiness timeout is only logged.
///
/// # Example
///
/// ```no_run
/// use portwarden_core::{run_server, ServerConfig};
///
/// # fn example() -> portwarden_core::Result<()> {
/// let config = ServerConfig::new().with_port(6006);
/// let handle = run_server("npm run storybook", &config, Some(|| println!("ready")))?;
/// println!("started pid {}", handle.pid());
/// # Ok(())
/// # }
/// ```
pub fn run_server<F>(command: &str, config: &ServerConfig, on_ready: Option<F>) -> Result<ProcessHandle>
where
    F: FnOnce() + Send + 'static,
{
    default_lifecycle().start(command, config, on_ready)
}

/// Poll `port` until it answers, then call `on_ready`.
///
/// The host probed is `config.host`, falling back to `127.0.0.1`.
pub async fn wait_until_ready<F>(port: u16, config: &ServerConfig, on_ready: F) -> Result<()>
where
    F: FnOnce(),
{
    default_lifecycle()
        .wait_until_ready(port, config, on_ready)
        .await
}
