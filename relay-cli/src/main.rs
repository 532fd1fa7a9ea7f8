//! Relay CLI
//!
//! Command-line interface for interacting with the Relay orchestrator.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Relay automation orchestrator CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL
    #[arg(
        long,
        env = "RELAY_ORCHESTRATOR_URL",
        default_value = "http://localhost:8080"
    )]
    orchestrator_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        orchestrator_url: cli.orchestrator_url,
    };

    handle_command(cli.command, &config).await
}
