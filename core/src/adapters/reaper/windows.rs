//! Windows listener lookup using netstat.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

use super::utils::Utils;
use super::PidLookup;

/// Windows-specific listener lookup.
pub struct WindowsLookup;

impl WindowsLookup {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl PidLookup for WindowsLookup {
    async fn listening_pids(&self, port: u16) -> Result<Vec<u32>> {
        let output = Command::new("netstat")
            .arg("-ano")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run netstat: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Utils::parse_netstat_pids(&stdout, port))
    }
}
