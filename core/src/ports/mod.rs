//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod probe;
mod reaper;

pub use probe::ReadinessProbePort;
pub use reaper::PortReaperPort;
