//! Workspace Affinity Repository

use chrono::{DateTime, Utc};
use relay_core::domain::affinity::WorkspaceAffinity;
use sqlx::PgPool;

/// Find the workspace mapped to a user
pub async fn find(pool: &PgPool, user_id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT workspace_id FROM user_workspaces WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Unconditional upsert
pub async fn upsert(pool: &PgPool, user_id: &str, workspace_id: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO user_workspaces (user_id, workspace_id, created_at, updated_at)
        VALUES ($1, $2, $3, $3)
        ON CONFLICT (user_id) DO UPDATE SET
            workspace_id = EXCLUDED.workspace_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(user_id)
    .bind(workspace_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Compare-and-swap write
///
/// With `expected = None` the row is inserted only if no mapping exists;
/// otherwise it is updated only while it still holds `expected`.
pub async fn compare_and_swap(
    pool: &PgPool,
    user_id: &str,
    expected: Option<&str>,
    workspace_id: &str,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now();

    let result = match expected {
        None => {
            sqlx::query(
                r#"
                INSERT INTO user_workspaces (user_id, workspace_id, created_at, updated_at)
                VALUES ($1, $2, $3, $3)
                ON CONFLICT (user_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(workspace_id)
            .bind(now)
            .execute(pool)
            .await?
        }
        Some(expected) => {
            sqlx::query(
                r#"
                UPDATE user_workspaces
                SET workspace_id = $1, updated_at = $2
                WHERE user_id = $3 AND workspace_id = $4
                "#,
            )
            .bind(workspace_id)
            .bind(now)
            .bind(user_id)
            .bind(expected)
            .execute(pool)
            .await?
        }
    };

    Ok(result.rows_affected() == 1)
}

/// List all mappings
pub async fn list_all(pool: &PgPool) -> Result<Vec<WorkspaceAffinity>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AffinityRow>(
        r#"
        SELECT user_id, workspace_id, updated_at
        FROM user_workspaces
        ORDER BY updated_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

#[derive(sqlx::FromRow)]
struct AffinityRow {
    user_id: String,
    workspace_id: String,
    updated_at: DateTime<Utc>,
}

impl From<AffinityRow> for WorkspaceAffinity {
    fn from(row: AffinityRow) -> Self {
        WorkspaceAffinity {
            user_id: row.user_id,
            workspace_id: row.workspace_id,
            updated_at: row.updated_at,
        }
    }
}
