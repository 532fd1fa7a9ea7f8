//! Credential Repository
//!
//! Stores the account email and a reference to the secret. The secret
//! itself never reaches the database.

use chrono::{DateTime, Utc};
use relay_core::domain::credential::{CreditStatus, SecretRef, UserCredentialRecord};
use sqlx::PgPool;

use super::{StoreError, StoreResult};

/// Find the credential record for a user
pub async fn find(pool: &PgPool, user_id: &str) -> StoreResult<Option<UserCredentialRecord>> {
    let row = sqlx::query_as::<_, CredentialRow>(
        r#"
        SELECT user_id, email, secret_ref, credit_status, is_first_login, updated_at
        FROM user_credentials
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(UserCredentialRecord::try_from).transpose()
}

/// Create or update a record
///
/// Updates keep the credit status and first-login flag of the existing row.
pub async fn upsert(
    pool: &PgPool,
    user_id: &str,
    email: &str,
    secret_ref: &SecretRef,
) -> StoreResult<UserCredentialRecord> {
    let now = Utc::now();

    let row = sqlx::query_as::<_, CredentialRow>(
        r#"
        INSERT INTO user_credentials
            (user_id, email, secret_ref, credit_status, is_first_login, created_at, updated_at)
        VALUES ($1, $2, $3, 'active', TRUE, $4, $4)
        ON CONFLICT (user_id) DO UPDATE SET
            email = EXCLUDED.email,
            secret_ref = EXCLUDED.secret_ref,
            updated_at = EXCLUDED.updated_at
        RETURNING user_id, email, secret_ref, credit_status, is_first_login, updated_at
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(secret_ref.as_str())
    .bind(now)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// Clear the first-login flag
pub async fn clear_first_login(pool: &PgPool, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE user_credentials SET is_first_login = FALSE, updated_at = $1 WHERE user_id = $2",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update the credit status; false if the user has no record
pub async fn update_credit_status(
    pool: &PgPool,
    user_id: &str,
    status: CreditStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_credentials SET credit_status = $1, updated_at = $2 WHERE user_id = $3",
    )
    .bind(status.as_str())
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: String,
    email: String,
    secret_ref: String,
    credit_status: String,
    is_first_login: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CredentialRow> for UserCredentialRecord {
    type Error = StoreError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(UserCredentialRecord {
            user_id: row.user_id,
            email: row.email,
            secret_ref: SecretRef::new(row.secret_ref),
            credit_status: row.credit_status.parse().map_err(StoreError::Corrupt)?,
            is_first_login: row.is_first_login,
            updated_at: row.updated_at,
        })
    }
}
