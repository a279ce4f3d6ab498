//! Probe command - single readiness check.

use anyhow::Result;

use super::Context;

pub async fn run(ctx: &Context, port: u16, host: Option<String>) -> Result<bool> {
    let host = host.unwrap_or_else(|| ctx.config.server.host().to_string());
    let running = ctx.lifecycle().is_server_running(port, &host).await;

    if ctx.json {
        let out = serde_json::json!({ "host": host, "port": port, "running": running });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if running {
        println!("http://{}:{}/ is up", host, port);
    } else {
        println!("http://{}:{}/ is not answering", host, port);
    }

    Ok(running)
}
