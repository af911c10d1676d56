//! # room-cli
//!
//! Terminal client for roomsync room servers.
//!
//! ## Commands
//!
//! - `rooms`: Print the server's room list and exit
//! - `session`: Interactive lobby and room chat
//!
//! ## Example
//!
//! ```bash
//! # What is open right now?
//! room-cli --server ws://localhost:3000/ws rooms
//!
//! # Join in as alice
//! room-cli --name alice session
//! > /create
//! > hello everyone
//! > /leave
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod render;
mod repl;

use commands::{rooms, session};
use config::CliConfig;

/// Terminal client for roomsync room servers.
#[derive(Parser, Debug)]
#[command(name = "room-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/roomsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server URL, overriding the config file
    #[arg(long, short, global = true)]
    server: Option<String>,

    /// Player name, overriding the config file
    #[arg(long, short, global = true)]
    name: Option<String>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the room list and exit
    Rooms,

    /// Start an interactive session
    Session,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CliConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(cli.server, cli.name);
    tracing::debug!(url = %config.server.url, "configuration loaded");

    match cli.command {
        Commands::Rooms => rooms::run(&config).await?,
        Commands::Session => session::run(&config).await?,
    }

    Ok(())
}

/// Install the tracing subscriber, logging to stderr.
fn init_logging(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
