//! Port reaper port (interface).

/// Port for freeing a TCP port.
///
/// Implementations terminate whatever process listens on the port. The call
/// is best-effort: "nothing was listening" and helper failures are normal
/// outcomes, so there is no error to return.
pub trait PortReaperPort: Send + Sync {
    /// Kill the process bound to `port`, if any, and wait for the helper to finish.
    fn reap(&self, port: u16) -> impl std::future::Future<Output = ()> + Send;
}
