use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // User -> workspace affinity, one row per user
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_workspaces (
            user_id VARCHAR(255) PRIMARY KEY,
            workspace_id VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Credentials hold a secret reference only
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_credentials (
            user_id VARCHAR(255) PRIMARY KEY,
            email VARCHAR(255) NOT NULL,
            secret_ref TEXT NOT NULL,
            credit_status VARCHAR(50) NOT NULL DEFAULT 'active',
            is_first_login BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_history (
            job_id VARCHAR(255) PRIMARY KEY,
            user_id VARCHAR(255) NOT NULL,
            prompt TEXT NOT NULL,
            model VARCHAR(255) NOT NULL,
            action VARCHAR(255) NOT NULL,
            route VARCHAR(255) NOT NULL,
            callback_url TEXT NOT NULL,
            timeout_seconds BIGINT NOT NULL,
            status VARCHAR(50) NOT NULL,
            result_artifact TEXT,
            error TEXT,
            error_kind VARCHAR(50),
            created_at TIMESTAMPTZ NOT NULL,
            completed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_history_user_id ON job_history(user_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_job_history_created_at ON job_history(created_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
