//! Portwarden CLI - Free ports and manage local dev servers
//!
//! A command-line tool for killing whatever holds a port, probing a
//! server for readiness, and starting or stopping servers around test runs.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use portwarden_core::ReaperStrategy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "portwarden")]
#[command(author, version, about = "Free ports and start, stop and poll local dev servers")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of ~/.portwarden/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

/// Probe timing flags shared by the polling commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TimingArgs {
    /// Host to probe
    #[arg(long)]
    pub host: Option<String>,

    /// Deadline in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Delay between probes in milliseconds
    #[arg(long)]
    pub poll_interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Kill whatever process is listening on a port
    Kill {
        /// Port number to free
        port: u16,

        /// How to free the port: kill-port or native
        #[arg(short, long)]
        strategy: Option<ReaperStrategy>,
    },

    /// Check whether a server answers GET / with 200
    Probe {
        /// Port number to probe
        port: u16,

        /// Host to probe
        #[arg(long)]
        host: Option<String>,
    },

    /// Free a server's port and wait until it stops answering
    Stop {
        /// Port the server listens on
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        timing: TimingArgs,
    },

    /// Start a server command detached from this process
    Run {
        /// Shell command that starts the server
        command: String,

        /// Port the server will listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Wait until the server answers before exiting
        #[arg(short, long)]
        wait: bool,

        /// Working directory for the server
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Extra environment variables (KEY=VALUE)
        #[arg(short, long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,

        #[command(flatten)]
        timing: TimingArgs,
    },

    /// Wait until a server answers on a port
    Wait {
        /// Port number to poll
        port: u16,

        #[command(flatten)]
        timing: TimingArgs,
    },

    /// Show current configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "portwarden=debug,portwarden_core=debug",
        _ => "portwarden=trace,portwarden_core=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = commands::Context::load(cli.config.clone(), cli.json).await?;

    let ok = match cli.command {
        Commands::Kill { port, strategy } => commands::kill::run(&ctx, port, strategy).await?,
        Commands::Probe { port, host } => commands::probe::run(&ctx, port, host).await?,
        Commands::Stop { port, timing } => commands::stop::run(&ctx, port, &timing).await?,
        Commands::Run {
            command,
            port,
            wait,
            cwd,
            env,
            timing,
        } => {
            let spawn = commands::run::SpawnArgs { cwd, env };
            commands::run::run(&ctx, &command, port, wait, spawn, &timing).await?
        }
        Commands::Wait { port, timing } => commands::wait::run(&ctx, port, &timing).await?,
        Commands::Config { init } => commands::config::show(&ctx, init).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_env_and_timing() {
        let cli = Cli::try_parse_from([
            "portwarden",
            "run",
            "npm start",
            "--port",
            "3000",
            "--wait",
            "-e",
            "NODE_ENV=test",
            "--timeout",
            "1000",
            "--poll-interval",
            "100",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                command,
                port,
                wait,
                env,
                timing,
                ..
            } => {
                assert_eq!(command, "npm start");
                assert_eq!(port, Some(3000));
                assert!(wait);
                assert_eq!(env, vec![("NODE_ENV".to_string(), "test".to_string())]);
                assert_eq!(timing.timeout, Some(1000));
                assert_eq!(timing.poll_interval, Some(100));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_kill_strategy() {
        let cli = Cli::try_parse_from(["portwarden", "kill", "6006", "--strategy", "native"]).unwrap();
        match cli.command {
            Commands::Kill { port, strategy } => {
                assert_eq!(port, 6006);
                assert_eq!(strategy, Some(ReaperStrategy::Native));
            }
            _ => panic!("expected kill command"),
        }

        assert!(Cli::try_parse_from(["portwarden", "kill", "6006", "--strategy", "pkill"]).is_err());
    }

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("A=b=c").unwrap(),
            ("A".to_string(), "b=c".to_string())
        );
        assert!(parse_env_pair("=x").is_err());
        assert!(parse_env_pair("novalue").is_err());
    }
}
