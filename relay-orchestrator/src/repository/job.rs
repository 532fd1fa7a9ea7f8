//! Job History Repository
//!
//! One row per job id. Every write is an upsert, so replaying an id replaces
//! the previous row instead of accumulating duplicates.

use chrono::{DateTime, Utc};
use relay_core::domain::error::ErrorKind;
use relay_core::domain::job::{Job, JobStatus};
use relay_core::dto::user::UserStats;
use sqlx::PgPool;

use super::{StoreError, StoreResult};

/// Insert or replace the history row for `job.id`
pub async fn upsert(pool: &PgPool, job: &Job) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO job_history (
            job_id, user_id, prompt, model, action, route, callback_url,
            timeout_seconds, status, result_artifact, error, error_kind,
            created_at, completed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (job_id) DO UPDATE SET
            user_id = EXCLUDED.user_id,
            prompt = EXCLUDED.prompt,
            model = EXCLUDED.model,
            action = EXCLUDED.action,
            route = EXCLUDED.route,
            callback_url = EXCLUDED.callback_url,
            timeout_seconds = EXCLUDED.timeout_seconds,
            status = EXCLUDED.status,
            result_artifact = EXCLUDED.result_artifact,
            error = EXCLUDED.error,
            error_kind = EXCLUDED.error_kind,
            created_at = EXCLUDED.created_at,
            completed_at = EXCLUDED.completed_at
        "#,
    )
    .bind(&job.id)
    .bind(&job.user_id)
    .bind(&job.prompt)
    .bind(&job.model)
    .bind(&job.action)
    .bind(&job.route)
    .bind(&job.callback_url)
    .bind(i64::try_from(job.timeout_seconds).unwrap_or(i64::MAX))
    .bind(job.status.as_str())
    .bind(&job.result_artifact)
    .bind(&job.error)
    .bind(job.error_kind.map(ErrorKind::as_str))
    .bind(job.created_at)
    .bind(job.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a history row by job id
pub async fn find_by_id(pool: &PgPool, job_id: &str) -> StoreResult<Option<Job>> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT job_id, user_id, prompt, model, action, route, callback_url,
               timeout_seconds, status, result_artifact, error, error_kind,
               created_at, completed_at
        FROM job_history
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.map(Job::try_from).transpose()
}

/// Aggregate counts for one user, with the credit status when credentials exist
pub async fn user_stats(pool: &PgPool, user_id: &str) -> StoreResult<UserStats> {
    let row = sqlx::query_as::<_, StatsRow>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status IN ('completed_with_artifact', 'completed_no_artifact')) AS completed,
            COUNT(*) FILTER (WHERE status = 'completed_no_artifact') AS no_artifact,
            COUNT(*) FILTER (WHERE status = 'failed') AS failed,
            (SELECT credit_status FROM user_credentials WHERE user_id = $1) AS credit_status
        FROM job_history
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let credit_status = row
        .credit_status
        .map(|s| s.parse().map_err(StoreError::Corrupt))
        .transpose()?;

    Ok(UserStats {
        user_id: user_id.to_string(),
        total_jobs: row.total,
        completed_jobs: row.completed,
        no_artifact_jobs: row.no_artifact,
        failed_jobs: row.failed,
        credit_status,
    })
}

/// Delete terminal rows created before the cutoff
pub async fn delete_terminal_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let terminal: Vec<&str> = [
        JobStatus::CompletedWithArtifact,
        JobStatus::CompletedNoArtifact,
        JobStatus::Failed,
    ]
    .iter()
    .map(|s| s.as_str())
    .collect();

    let result = sqlx::query("DELETE FROM job_history WHERE created_at < $1 AND status = ANY($2)")
        .bind(cutoff)
        .bind(terminal)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    job_id: String,
    user_id: String,
    prompt: String,
    model: String,
    action: String,
    route: String,
    callback_url: String,
    timeout_seconds: i64,
    status: String,
    result_artifact: Option<String>,
    error: Option<String>,
    error_kind: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(StoreError::Corrupt)?;
        let error_kind = row
            .error_kind
            .map(|k| k.parse().map_err(StoreError::Corrupt))
            .transpose()?;

        Ok(Job {
            id: row.job_id,
            user_id: row.user_id,
            prompt: row.prompt,
            model: row.model,
            action: row.action,
            route: row.route,
            callback_url: row.callback_url,
            timeout_seconds: u64::try_from(row.timeout_seconds).unwrap_or_default(),
            status,
            created_at: row.created_at,
            completed_at: row.completed_at,
            result_artifact: row.result_artifact,
            error: row.error,
            error_kind,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    completed: i64,
    no_artifact: i64,
    failed: i64,
    credit_status: Option<String>,
}
