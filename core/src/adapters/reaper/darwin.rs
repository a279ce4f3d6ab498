//! macOS listener lookup using lsof.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

use super::utils::Utils;
use super::PidLookup;

/// macOS-specific listener lookup.
pub struct DarwinLookup;

impl DarwinLookup {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DarwinLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl PidLookup for DarwinLookup {
    async fn listening_pids(&self, port: u16) -> Result<Vec<u32>> {
        let output = Command::new("/usr/sbin/lsof")
            .args(["-nP", "-t", &format!("-iTCP:{}", port), "-sTCP:LISTEN"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run lsof: {}", e)))?;

        // lsof exits 1 when nothing matches; the empty stdout says the same.
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in lsof output: {}", e)))?;

        Ok(Utils::parse_lsof_pids(&stdout))
    }
}
