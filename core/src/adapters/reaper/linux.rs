//! Linux listener lookup using ss, falling back to lsof.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

use super::utils::Utils;
use super::PidLookup;

/// Linux-specific listener lookup.
pub struct LinuxLookup;

impl LinuxLookup {
    pub fn new() -> Self {
        Self
    }

    async fn lookup_with_lsof(&self, port: u16) -> Result<Vec<u32>> {
        let output = Command::new("lsof")
            .args(["-nP", "-t", &format!("-iTCP:{}", port), "-sTCP:LISTEN"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run lsof: {}", e)))?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in lsof output: {}", e)))?;

        Ok(Utils::parse_lsof_pids(&stdout))
    }
}

impl Default for LinuxLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl PidLookup for LinuxLookup {
    async fn listening_pids(&self, port: u16) -> Result<Vec<u32>> {
        let output = match Command::new("ss")
            .args(["-Htlnp"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "ss unavailable, trying lsof");
                return self.lookup_with_lsof(port).await;
            }
        };

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in ss output: {}", e)))?;

        Ok(Utils::parse_ss_pids(&stdout, port))
    }
}
