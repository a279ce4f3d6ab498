//! Run command - start a server detached.

use std::path::PathBuf;

use anyhow::Result;

use super::Context;
use crate::TimingArgs;

/// Spawn overrides given on the command line.
#[derive(Debug, Default)]
pub struct SpawnArgs {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

pub async fn run(
    ctx: &Context,
    command: &str,
    port: Option<u16>,
    wait: bool,
    spawn: SpawnArgs,
    timing: &TimingArgs,
) -> Result<bool> {
    let mut config = ctx.server_config(port, timing);
    if let Some(cwd) = spawn.cwd {
        config.spawn.cwd = Some(cwd);
    }
    config.spawn.env.extend(spawn.env);

    let lifecycle = ctx.lifecycle();
    let handle = lifecycle.start::<fn()>(command, &config, None)?;
    let pid = handle.pid();
    let port = config.port();

    // The child leads its own process group; dropping the handle leaves it running.
    drop(handle);

    if wait {
        lifecycle.wait_until_ready(port, &config, || {}).await?;
    }

    if ctx.json {
        let out = serde_json::json!({
            "pid": pid,
            "port": port,
            "command": command,
            "ready": wait,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if wait {
        println!("Started pid {} (ready on port {})", pid, port);
    } else {
        println!("Started pid {}", pid);
    }

    Ok(true)
}
