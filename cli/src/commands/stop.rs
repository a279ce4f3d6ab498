//! Stop command - free a server's port and confirm it is gone.

use anyhow::Result;

use super::{millis, Context};
use crate::TimingArgs;

pub async fn run(ctx: &Context, port: Option<u16>, timing: &TimingArgs) -> Result<bool> {
    let config = ctx.server_config(port, timing);
    let settings = config.stop_settings();

    ctx.lifecycle().stop(&config).await?;

    if ctx.json {
        let out = serde_json::json!({
            "port": settings.port,
            "stopped": true,
            "timeoutMs": millis(settings.timeout),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Port {} is free", settings.port);
    }

    Ok(true)
}
