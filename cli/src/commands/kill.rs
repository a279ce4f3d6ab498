//! Kill command - free a port.

use anyhow::Result;
use portwarden_core::{PortReaper, ReaperStrategy};

use super::Context;

pub async fn run(ctx: &Context, port: u16, strategy: Option<ReaperStrategy>) -> Result<bool> {
    let mut options = ctx.config.reaper.clone();
    if let Some(strategy) = strategy {
        options.strategy = strategy;
    }
    let strategy = options.strategy.to_string();

    PortReaper::with_options(options).kill_process_on_port(port).await;

    if ctx.json {
        let out = serde_json::json!({ "port": port, "strategy": strategy });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Ran {} on port {}", strategy, port);
    }

    Ok(true)
}
