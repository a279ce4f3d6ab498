//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`,
//! plus the detached process spawner used by the lifecycle.

pub mod probe;
pub mod reaper;
pub mod spawner;

// Re-export main types for convenience
pub use probe::{HttpProbe, PROBE_TIMEOUT};
pub use reaper::PortReaper;
pub use spawner::{spawn_detached, ProcessHandle};
