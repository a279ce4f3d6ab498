//! Spawn options domain model.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the server command is spawned.
///
/// Defaults describe a detached child with discarded stdio that runs in the
/// caller's working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnOptions {
    /// Working directory; the current directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Start from an empty environment instead of inheriting ours.
    #[serde(default)]
    pub clear_env: bool,

    /// Put the child in its own process group so it outlives us.
    #[serde(default = "default_true")]
    pub detached: bool,

    /// Forward stdio instead of discarding it.
    #[serde(default)]
    pub inherit_stdio: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: BTreeMap::new(),
            clear_env: false,
            detached: true,
            inherit_stdio: false,
        }
    }
}

impl SpawnOptions {
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Layer `other` on top of `self`.
    ///
    /// `cwd` is replaced when `other` sets one, env maps are unioned with
    /// `other` winning, and the flags always come from `other`.
    pub fn merged_with(&self, other: &SpawnOptions) -> SpawnOptions {
        let mut env = self.env.clone();
        env.extend(other.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        SpawnOptions {
            cwd: other.cwd.clone().or_else(|| self.cwd.clone()),
            env,
            clear_env: other.clear_env,
            detached: other.detached,
            inherit_stdio: other.inherit_stdio,
        }
    }
}
