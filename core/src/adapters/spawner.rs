//! Detached server process spawning.
//!
//! The server command runs through the platform shell in its own process
//! group (Unix) or without a console window (Windows), so it keeps running
//! after the calling process exits.

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::domain::SpawnOptions;
use crate::error::{Error, Result};

/// A handle to a spawned server process.
///
/// The handle is owned by the caller. Dropping it neither kills nor waits on
/// the child.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    command: String,
}

impl ProcessHandle {
    /// OS process id of the shell running the command.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// The command line the process was started with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Non-blocking check for exit.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Block until the process exits.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }

    /// Kill the process.
    ///
    /// On Unix a detached child leads its own process group, so the whole
    /// group is signalled and processes started by the shell go with it.
    pub fn kill(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if killpg(Pid::from_raw(self.child.id() as i32), Signal::SIGKILL).is_ok() {
                return Ok(());
            }
        }

        self.child.kill()
    }
}

/// Spawn `command` through the shell with `options` applied.
pub fn spawn_detached(command: &str, options: &SpawnOptions) -> Result<ProcessHandle> {
    let mut cmd = shell_command(command);

    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir()?,
    };
    cmd.current_dir(&cwd);

    if options.clear_env {
        cmd.env_clear();
    }
    cmd.envs(&options.env);

    if options.inherit_stdio {
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
    } else {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
    }

    if options.detached {
        detach(&mut cmd);
    }

    let child = cmd
        .spawn()
        .map_err(|e| Error::Spawn(format!("'{}': {}", command, e)))?;

    debug!(
        pid = child.id(),
        command = command,
        cwd = %cwd.display(),
        detached = options.detached,
        "Spawned server process"
    );

    Ok(ProcessHandle {
        child,
        command: command.to_string(),
    })
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_runs_in_requested_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let options = SpawnOptions::default().with_cwd(dir.path());

        let mut handle = spawn_detached("pwd > where.txt", &options).unwrap();
        assert!(handle.wait().unwrap().success());

        let written = std::fs::read_to_string(dir.path().join("where.txt")).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(written.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[test]
    fn test_spawn_passes_env() {
        let dir = tempfile::tempdir().unwrap();
        let options = SpawnOptions::default()
            .with_cwd(dir.path())
            .with_env("PORTWARDEN_TEST_VALUE", "hello");

        let mut handle = spawn_detached("echo $PORTWARDEN_TEST_VALUE > env.txt", &options).unwrap();
        assert!(handle.wait().unwrap().success());

        let written = std::fs::read_to_string(dir.path().join("env.txt")).unwrap();
        assert_eq!(written.trim(), "hello");
    }

    #[test]
    fn test_kill_stops_long_running_process() {
        let mut handle = spawn_detached("sleep 30", &SpawnOptions::default()).unwrap();
        assert_eq!(handle.command(), "sleep 30");
        assert!(handle.try_wait().unwrap().is_none());

        handle.kill().unwrap();
        let status = handle.wait().unwrap();
        assert!(!status.success());
    }

    #[test]
    fn test_spawn_missing_cwd_fails() {
        let options = SpawnOptions::default().with_cwd("/definitely/not/a/dir");
        let result = spawn_detached("true", &options);
        assert!(matches!(result, Err(Error::Spawn(_))));
    }
}
