//! Domain layer - Plain data describing servers, spawns and reapers.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod reaper;
mod server_config;
mod spawn;

pub use reaper::{ReaperOptions, ReaperStrategy, PORT_PLACEHOLDER};
pub use server_config::{
    PollSettings, ServerConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_READY_POLL_INTERVAL,
    DEFAULT_READY_TIMEOUT, DEFAULT_STOP_POLL_INTERVAL, DEFAULT_STOP_TIMEOUT,
};
pub use spawn::SpawnOptions;
