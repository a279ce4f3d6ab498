//! HTTP readiness probe.
//!
//! One GET to `/` per probe. Only an exact `200 OK` counts as ready;
//! redirects are not followed so a `302` reads as "not ready".

use std::time::Duration;

use reqwest::{redirect, Client, StatusCode};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::ReadinessProbePort;

/// Per-request timeout for a single probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Readiness probe backed by a plain HTTP client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Create a probe with the default 2000ms request timeout.
    pub fn new() -> Self {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    /// Create a probe with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap_or_else(|e| {
                debug!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self { client }
    }

    /// Probe `host:port` and fold every failure into `false`.
    pub async fn is_server_running(&self, port: u16, host: &str) -> bool {
        match self.probe(host, port).await {
            Ok(ready) => ready,
            Err(e) => {
                debug!(host = host, port = port, error = %e, "Probe failed");
                false
            }
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessProbePort for HttpProbe {
    async fn probe(&self, host: &str, port: u16) -> Result<bool> {
        let url = probe_url(host, port);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Probe(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url = %url, status = %status, "Server answered but is not ready");
        }

        Ok(status == StatusCode::OK)
    }
}

/// Build the probe URL, bracketing IPv6 literals.
fn probe_url(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{}]:{}/", host, port)
    } else {
        format!("http://{}:{}/", host, port)
    }
}
