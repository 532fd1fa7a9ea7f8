//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod system;
mod user;

pub use job::SubmitArgs;
pub use user::CredentialCommands;

use anyhow::Result;
use clap::Subcommand;
use relay_client::OrchestratorClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit an automation job
    Submit(SubmitArgs),
    /// Show a job's recorded status
    Job {
        /// Job ID
        id: String,
    },
    /// Show queued and running jobs
    Sessions,
    /// Check orchestrator health
    Health,
    /// List user to workspace affinities
    Affinities,
    /// Show job statistics for a user
    Stats {
        /// User ID
        user_id: String,
    },
    /// Manage user credentials
    Credentials {
        #[command(subcommand)]
        command: CredentialCommands,
    },
    /// Delete finished job history
    Cleanup {
        /// Age in days; defaults to the orchestrator's retention setting
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        Commands::Submit(args) => job::submit(&client, args).await,
        Commands::Job { id } => job::show_job(&client, &id).await,
        Commands::Sessions => job::show_sessions(&client).await,
        Commands::Health => system::health(&client).await,
        Commands::Affinities => system::list_affinities(&client).await,
        Commands::Stats { user_id } => user::show_stats(&client, &user_id).await,
        Commands::Credentials { command } => user::handle_credential_command(&client, command).await,
        Commands::Cleanup { days } => system::cleanup(&client, days).await,
    }
}
