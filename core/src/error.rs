//! Error types for the portwarden-core library.

use thiserror::Error;

/// Result type alias for portwarden operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reaping ports and managing server processes.
#[derive(Error, Debug)]
pub enum Error {
    /// The port was still answering when the stop deadline expired.
    #[error("Failed to free port {port} after {timeout_ms}ms")]
    PortStillBound { port: u16, timeout_ms: u64 },

    /// The server never answered the readiness probe before the deadline.
    #[error("Server not responsive after {timeout_ms}ms")]
    ServerNotReady { timeout_ms: u64 },

    /// The server command could not be spawned.
    #[error("Failed to spawn server command: {0}")]
    Spawn(String),

    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// A readiness probe could not be issued.
    #[error("Probe failed: {0}")]
    Probe(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
