//! Config command - show or initialise the configuration file.

use anyhow::Result;

use super::Context;

pub async fn show(ctx: &Context, init: bool) -> Result<bool> {
    if init {
        ctx.store.save(&ctx.config).await?;
    }

    if ctx.json {
        let out = serde_json::json!({
            "path": ctx.store.path().display().to_string(),
            "config": ctx.config,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(true);
    }

    let stop = ctx.config.server.stop_settings();
    let ready = ctx.config.server.ready_settings();

    println!("Config file: {}", ctx.store.path().display());
    if init {
        println!("(written)");
    }
    println!();
    println!("Server:   {}:{}", stop.host, stop.port);
    println!(
        "Stop:     timeout {}ms, poll every {}ms",
        stop.timeout.as_millis(),
        stop.poll_interval.as_millis()
    );
    println!(
        "Ready:    timeout {}ms, poll every {}ms",
        ready.timeout.as_millis(),
        ready.poll_interval.as_millis()
    );
    println!("Reaper:   {}", ctx.config.reaper.strategy);

    Ok(true)
}
