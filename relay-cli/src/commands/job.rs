//! Job command handlers
//!
//! Submitting jobs and inspecting their progress.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::*;
use relay_client::OrchestratorClient;
use relay_core::domain::job::{Job, JobStatus};
use relay_core::dto::job::SubmitJob;
use uuid::Uuid;

/// Arguments of `relay submit`
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// User whose account and workspace run the job
    #[arg(long)]
    pub user: String,

    /// Generation prompt
    #[arg(long)]
    pub prompt: String,

    /// URL that receives lifecycle callbacks
    #[arg(long)]
    pub callback_url: String,

    /// Job ID (random when omitted)
    #[arg(long)]
    pub job_id: Option<String>,

    #[arg(long, default_value = "video")]
    pub model: String,

    #[arg(long, default_value = "create_project")]
    pub action: String,

    /// Deadline in seconds, 0 for the orchestrator default
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Route segment of `/automation/<route>`
    #[arg(long, default_value = "google-flow")]
    pub route: String,
}

impl SubmitArgs {
    fn to_request(&self) -> SubmitJob {
        SubmitJob {
            job_id: Some(
                self.job_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            ),
            prompt: Some(self.prompt.clone()),
            model: Some(self.model.clone()),
            timestamp: Some(Utc::now().to_rfc3339()),
            user_id: Some(self.user.clone()),
            action: Some(self.action.clone()),
            timeout: Some(self.timeout),
            callback_url: Some(self.callback_url.clone()),
        }
    }
}

pub async fn submit(client: &OrchestratorClient, args: SubmitArgs) -> Result<()> {
    let request = args.to_request();
    let accepted = client
        .submit_job(&args.route, &request)
        .await
        .context("Failed to submit job")?;

    println!("{}", "✓ Job accepted".green().bold());
    println!("  Job ID:  {}", accepted.job_id.cyan());
    println!("  Action:  {}", accepted.action);
    println!("  {}", accepted.message.dimmed());

    Ok(())
}

pub async fn show_job(client: &OrchestratorClient, id: &str) -> Result<()> {
    let job = client.get_job(id).await?;
    print_job_details(&job);
    Ok(())
}

pub async fn show_sessions(client: &OrchestratorClient) -> Result<()> {
    let overview = client.sessions().await?;

    println!(
        "{}",
        format!(
            "{} job(s) in flight ({} worker slot(s), queue capacity {})",
            overview.total, overview.max_parallel_jobs, overview.queue_capacity
        )
        .bold()
    );

    for session in overview.active {
        println!(
            "  {} {} user {} {} since {}",
            "▸".cyan(),
            session.job_id.cyan(),
            session.user_id,
            format!("{:?}", session.stage).yellow(),
            session.since.format("%H:%M:%S").to_string().dimmed()
        );
    }

    Ok(())
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.id.cyan());
    println!("  User:      {}", job.user_id);
    println!("  Route:     {}", job.route.dimmed());
    println!("  Status:    {}", colorize_status(job.status));
    println!("  Prompt:    {}", job.prompt);
    println!("  Created:   {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(completed) = job.completed_at {
        println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S"));
        let seconds = completed.signed_duration_since(job.created_at).num_seconds();
        println!("  Duration:  {}s", seconds);
    }

    if let Some(artifact) = &job.result_artifact {
        println!("  Artifact:  {}", artifact.green());
    }

    if let Some(error) = &job.error {
        let kind = job
            .error_kind
            .map(|k| format!(" ({})", k))
            .unwrap_or_default();
        println!("\n{}{}", "Error:".bold(), kind.dimmed());
        println!("{}", error.red());
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::Accepted => status_str.yellow(),
        JobStatus::Processing => status_str.cyan(),
        JobStatus::CompletedWithArtifact => status_str.green(),
        JobStatus::CompletedNoArtifact => status_str.yellow(),
        JobStatus::Failed => status_str.red(),
    }
}
