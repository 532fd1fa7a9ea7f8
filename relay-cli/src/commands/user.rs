//! User command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use relay_client::OrchestratorClient;
use relay_core::domain::credential::SecretRef;
use relay_core::dto::user::SetCredentials;

/// Credential subcommands
#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Register or update the account a user's jobs sign in with
    Set {
        /// User ID
        user_id: String,

        #[arg(long)]
        email: String,

        /// Where the password lives: `env:NAME` or `file:/path`
        #[arg(long)]
        secret_ref: String,
    },
}

pub async fn handle_credential_command(
    client: &OrchestratorClient,
    command: CredentialCommands,
) -> Result<()> {
    match command {
        CredentialCommands::Set {
            user_id,
            email,
            secret_ref,
        } => {
            let summary = client
                .set_credentials(
                    &user_id,
                    &SetCredentials {
                        email,
                        secret_ref: SecretRef::new(secret_ref),
                    },
                )
                .await?;

            println!("{}", "✓ Credentials stored".green().bold());
            println!("  User:        {}", summary.user_id.cyan());
            println!("  Email:       {}", summary.email);
            println!("  Credits:     {}", summary.credit_status.as_str());
            println!("  First login: {}", summary.is_first_login);
            Ok(())
        }
    }
}

pub async fn show_stats(client: &OrchestratorClient, user_id: &str) -> Result<()> {
    let stats = client.user_stats(user_id).await?;

    println!("{}", format!("Statistics for {}:", stats.user_id).bold());
    println!("  Total:        {}", stats.total_jobs);
    println!("  Completed:    {}", stats.completed_jobs.to_string().green());
    println!("  No artifact:  {}", stats.no_artifact_jobs.to_string().yellow());
    println!("  Failed:       {}", stats.failed_jobs.to_string().red());
    match stats.credit_status {
        Some(status) => println!("  Credits:      {}", status.as_str()),
        None => println!("  Credits:      {}", "no credentials registered".dimmed()),
    }

    Ok(())
}
