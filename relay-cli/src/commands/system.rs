//! Service-level command handlers

use anyhow::{Context, Result};
use colored::*;
use relay_client::OrchestratorClient;

pub async fn health(client: &OrchestratorClient) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("Orchestrator at {} is unreachable", client.base_url()))?;

    println!(
        "{} {} is {} ({})",
        "✓".green(),
        health.service,
        health.status.green(),
        health.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

pub async fn list_affinities(client: &OrchestratorClient) -> Result<()> {
    let affinities = client.list_affinities().await?;

    if affinities.is_empty() {
        println!("{}", "No affinities recorded.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} affinity(ies):", affinities.len()).bold());
    for affinity in affinities {
        println!(
            "  {} {} → {} {}",
            "▸".cyan(),
            affinity.user_id,
            affinity.workspace_id.cyan(),
            affinity
                .updated_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
    }
    Ok(())
}

pub async fn cleanup(client: &OrchestratorClient, days: Option<u32>) -> Result<()> {
    let result = client.cleanup_history(days).await?;

    println!(
        "{} Deleted {} history row(s) older than {} day(s)",
        "✓".green(),
        result.deleted,
        result.days
    );
    Ok(())
}
