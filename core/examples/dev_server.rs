//! Example: Start a dev server, wait for it, then stop it.
//!
//! ```text
//! cargo run -p portwarden-core --example dev_server -- "python3 -m http.server 8000" 8000
//! ```

use std::time::Duration;

use portwarden_core::{
    default_lifecycle, ReaperOptions, ReaperStrategy, ServerConfig, ServerLifecycle,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut args = std::env::args().skip(1);
    let command = args
        .next()
        .unwrap_or_else(|| "python3 -m http.server 8000".to_string());
    let port: u16 = args.next().and_then(|p| p.parse().ok()).unwrap_or(8000);

    let config = ServerConfig::new()
        .with_port(port)
        .with_timeout(Duration::from_secs(10))
        .with_poll_interval(Duration::from_millis(250));

    let lifecycle = default_lifecycle();

    println!("Starting: {}", command);
    let handle = match lifecycle.start::<fn()>(&command, &config, None) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error starting server: {}", e);
            return;
        }
    };
    println!("Spawned pid {}", handle.pid());

    match lifecycle
        .wait_until_ready(port, &config, || println!("Server is answering on port {}", port))
        .await
    {
        Ok(()) => {}
        Err(e) => eprintln!("Error waiting for server: {}", e),
    }

    // Free the port natively so the example works without npx.
    let stopper = ServerLifecycle::new(
        portwarden_core::PortReaper::with_options(ReaperOptions::with_strategy(
            ReaperStrategy::Native,
        )),
        portwarden_core::HttpProbe::new(),
    );

    match stopper.stop(&config).await {
        Ok(_) => println!("Port {} is free again", port),
        Err(e) => eprintln!("Error stopping server: {}", e),
    }
}
