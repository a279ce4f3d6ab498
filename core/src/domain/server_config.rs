//! Server configuration domain model.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SpawnOptions;

/// Host probed when none is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 6006;

/// Deadline for `stop` to see the port go quiet.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(5000);

/// Delay between probes while stopping.
pub const DEFAULT_STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Deadline for a server to start answering.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Delay between probes while waiting for readiness.
pub const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Caller-supplied settings for a single lifecycle call.
///
/// Every field is optional. Which default fills a missing field depends on
/// the operation reading the config, see [`ServerConfig::stop_settings`] and
/// [`ServerConfig::ready_settings`]. Durations are stored in milliseconds so
/// the JSON form matches what test harnesses usually write by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Hard deadline for the whole call, in milliseconds.
    #[serde(default, rename = "timeout", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Delay between two probes, in milliseconds.
    #[serde(default, rename = "pollInterval", skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    /// Host the readiness probe connects to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port the server listens on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Options merged over the defaults when spawning the server.
    #[serde(default)]
    pub spawn: SpawnOptions,
}

/// A [`ServerConfig`] with every default filled in for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Create an empty config (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(duration_ms(timeout));
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval_ms = Some(duration_ms(poll_interval));
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_spawn(mut self, spawn: SpawnOptions) -> Self {
        self.spawn = spawn;
        self
    }

    /// The configured port, or [`DEFAULT_PORT`].
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// The configured host, or [`DEFAULT_HOST`].
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Settings used when stopping a server (5s deadline, 200ms polls).
    pub fn stop_settings(&self) -> PollSettings {
        self.resolve(DEFAULT_STOP_TIMEOUT, DEFAULT_STOP_POLL_INTERVAL)
    }

    /// Settings used when waiting for a server to answer (30s deadline, 500ms polls).
    pub fn ready_settings(&self) -> PollSettings {
        self.resolve(DEFAULT_READY_TIMEOUT, DEFAULT_READY_POLL_INTERVAL)
    }

    /// Layer `other` on top of `self`: fields set in `other` win.
    pub fn merged_with(&self, other: &ServerConfig) -> ServerConfig {
        ServerConfig {
            timeout_ms: other.timeout_ms.or(self.timeout_ms),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            host: other.host.clone().or_else(|| self.host.clone()),
            port: other.port.or(self.port),
            spawn: self.spawn.merged_with(&other.spawn),
        }
    }

    fn resolve(&self, timeout: Duration, poll_interval: Duration) -> PollSettings {
        PollSettings {
            timeout: self.timeout_ms.map(Duration::from_millis).unwrap_or(timeout),
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(poll_interval),
            host: self.host().to_string(),
            port: self.port(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_defaults() {
        let settings = ServerConfig::new().stop_settings();
        assert_eq!(settings.timeout, Duration::from_millis(5000));
        assert_eq!(settings.poll_interval, Duration::from_millis(200));
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 6006);
    }

    #[test]
    fn test_ready_defaults() {
        let settings = ServerConfig::new().ready_settings();
        assert_eq!(settings.timeout, Duration::from_millis(30_000));
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides_apply_to_both_operations() {
        let config = ServerConfig::new()
            .with_timeout(Duration::from_millis(1000))
            .with_poll_interval(Duration::from_millis(100))
            .with_host("localhost")
            .with_port(9999);

        for settings in [config.stop_settings(), config.ready_settings()] {
            assert_eq!(settings.timeout, Duration::from_millis(1000));
            assert_eq!(settings.poll_interval, Duration::from_millis(100));
            assert_eq!(settings.host, "localhost");
            assert_eq!(settings.port, 9999);
        }
    }

    #[test]
    fn test_json_uses_millisecond_fields() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"timeout": 1000, "pollInterval": 100, "port": 8080}"#)
                .unwrap();
        assert_eq!(config.timeout_ms, Some(1000));
        assert_eq!(config.poll_interval_ms, Some(100));
        assert_eq!(config.port(), 8080);
        assert_eq!(config.host(), DEFAULT_HOST);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["pollInterval"], 100);
        assert!(json.get("host").is_none());
    }

    #[test]
    fn test_merged_with_prefers_overrides() {
        let file = ServerConfig::new().with_port(3000).with_timeout(Duration::from_secs(10));
        let flags = ServerConfig::new().with_port(4000);

        let merged = file.merged_with(&flags);
        assert_eq!(merged.port(), 4000);
        assert_eq!(merged.timeout_ms, Some(10_000));
    }
}
