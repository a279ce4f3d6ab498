//! Port reaper domain model.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Placeholder replaced with the port number in custom reaper arguments.
pub const PORT_PLACEHOLDER: &str = "{port}";

/// The mechanism used to free a port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ReaperStrategy {
    /// `npx --yes kill-port <port>`.
    #[default]
    KillPort,
    /// Look up the listening PIDs with the platform tools and kill them.
    Native,
    /// Run an arbitrary helper. `{port}` in any argument is replaced.
    Command { program: String, args: Vec<String> },
}

impl ReaperStrategy {
    /// The program and arguments to run for an external strategy.
    ///
    /// Returns `None` for [`ReaperStrategy::Native`], which does not shell out
    /// to a single helper.
    pub fn command_line(&self, port: u16) -> Option<(String, Vec<String>)> {
        match self {
            ReaperStrategy::KillPort => Some((
                npx_program().to_string(),
                vec!["--yes".into(), "kill-port".into(), port.to_string()],
            )),
            ReaperStrategy::Native => None,
            ReaperStrategy::Command { program, args } => {
                let port = port.to_string();
                let args = args
                    .iter()
                    .map(|arg| arg.replace(PORT_PLACEHOLDER, &port))
                    .collect();
                Some((program.clone(), args))
            }
        }
    }
}

impl std::fmt::Display for ReaperStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaperStrategy::KillPort => write!(f, "kill-port"),
            ReaperStrategy::Native => write!(f, "native"),
            ReaperStrategy::Command { program, .. } => write!(f, "command ({})", program),
        }
    }
}

impl std::str::FromStr for ReaperStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kill-port" => Ok(ReaperStrategy::KillPort),
            "native" => Ok(ReaperStrategy::Native),
            other => Err(format!(
                "unknown reaper strategy '{}' (expected kill-port or native)",
                other
            )),
        }
    }
}

#[cfg(windows)]
fn npx_program() -> &'static str {
    "npx.cmd"
}

#[cfg(not(windows))]
fn npx_program() -> &'static str {
    "npx"
}

/// Options forwarded to the helper that frees a port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaperOptions {
    #[serde(default)]
    pub strategy: ReaperStrategy,

    /// Working directory for the helper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the helper.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ReaperOptions {
    pub fn with_strategy(strategy: ReaperStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }
}
