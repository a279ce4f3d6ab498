//! Port reaper adapters.
//!
//! Frees a port either through an external helper (`npx kill-port` or a
//! caller-supplied command) or natively by looking up the listening PIDs
//! with the platform tools and killing them. Every failure is logged and
//! swallowed: "nothing was listening" is a normal outcome.

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

mod utils;

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::{ReaperOptions, ReaperStrategy};
use crate::error::Result;
use crate::ports::PortReaperPort;

pub use utils::Utils;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
use darwin::DarwinLookup as PlatformLookup;

#[cfg(target_os = "linux")]
use linux::LinuxLookup as PlatformLookup;

#[cfg(target_os = "windows")]
use windows::WindowsLookup as PlatformLookup;

/// Internal trait for platform-specific listener lookups.
trait PidLookup: Send + Sync {
    fn listening_pids(&self, port: u16)
        -> impl std::future::Future<Output = Result<Vec<u32>>> + Send;
}

/// Kills whatever process is bound to a TCP port.
#[derive(Debug, Clone, Default)]
pub struct PortReaper {
    options: ReaperOptions,
}

impl PortReaper {
    /// Create a reaper using `npx --yes kill-port`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reaper with explicit options.
    pub fn with_options(options: ReaperOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReaperOptions {
        &self.options
    }

    /// Free `port`. Never fails; returns once the mechanism has run.
    pub async fn kill_process_on_port(&self, port: u16) {
        match &self.options.strategy {
            ReaperStrategy::Native => self.reap_native(port).await,
            strategy => {
                if let Some((program, args)) = strategy.command_line(port) {
                    self.run_helper(port, &program, &args).await;
                }
            }
        }
    }

    async fn run_helper(&self, port: u16, program: &str, args: &[String]) {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&self.options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(cwd) = &self.options.cwd {
            cmd.current_dir(cwd);
        }

        debug!(port = port, program = program, "Running port reaper helper");

        match cmd.status().await {
            Ok(status) if status.success() => {
                debug!(port = port, "Port reaper helper finished");
            }
            Ok(status) => {
                // Usually means nothing was listening.
                debug!(port = port, code = ?status.code(), "Port reaper helper exited non-zero");
            }
            Err(e) => {
                debug!(port = port, program = program, error = %e, "Failed to run port reaper helper");
            }
        }
    }

    async fn reap_native(&self, port: u16) {
        let pids = match PlatformLookup::new().listening_pids(port).await {
            Ok(pids) => pids,
            Err(e) => {
                debug!(port = port, error = %e, "Listener lookup failed");
                return;
            }
        };

        if pids.is_empty() {
            debug!(port = port, "Nothing listening");
            return;
        }

        for pid in pids {
            if pid == std::process::id() {
                warn!(port = port, pid = pid, "Refusing to kill own process");
                continue;
            }
            kill_pid(pid).await;
        }
    }
}

impl PortReaperPort for PortReaper {
    async fn reap(&self, port: u16) {
        self.kill_process_on_port(port).await
    }
}

#[cfg(unix)]
async fn kill_pid(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => debug!(pid = pid, "Sent SIGKILL"),
        Err(e) => debug!(pid = pid, error = %e, "Failed to signal process"),
    }
}

#[cfg(windows)]
async fn kill_pid(pid: u32) {
    let result = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(status) => debug!(pid = pid, code = ?status.code(), "taskkill finished"),
        Err(e) => debug!(pid = pid, error = %e, "Failed to run taskkill"),
    }
}
