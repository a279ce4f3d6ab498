//! Readiness probe port (interface).

use crate::error::Result;

/// Port for checking whether a server answers.
///
/// `Ok(true)` means the server is ready. Implementations may report errors,
/// but callers in the lifecycle treat any `Err` exactly like `Ok(false)`.
pub trait ReadinessProbePort: Send + Sync {
    /// Perform a single bounded probe against `host:port`.
    fn probe(&self, host: &str, port: u16) -> impl std::future::Future<Output = Result<bool>> + Send;
}
