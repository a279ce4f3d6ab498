//! Wait command - block until a server answers.

use std::time::Instant;

use anyhow::Result;

use super::{millis, Context};
use crate::TimingArgs;

pub async fn run(ctx: &Context, port: u16, timing: &TimingArgs) -> Result<bool> {
    let config = ctx.server_config(Some(port), timing);
    let started = Instant::now();

    ctx.lifecycle()
        .wait_until_ready(port, &config, || {
            tracing::debug!(port = port, "Server answered");
        })
        .await?;

    let elapsed = millis(started.elapsed());
    if ctx.json {
        let out = serde_json::json!({ "port": port, "ready": true, "elapsedMs": elapsed });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Port {} ready after {}ms", port, elapsed);
    }

    Ok(true)
}
