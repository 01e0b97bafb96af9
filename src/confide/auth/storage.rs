//! Database helpers for users, secrets, and sessions.

use anyhow::{anyhow, Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::User;
use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

/// Outcome when attempting to insert a user that may already exist.
#[derive(Debug)]
pub(crate) enum InsertOutcome {
    Created(Uuid),
    Conflict,
}

/// Minimal data resolved from a valid session cookie.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub username: Option<String>,
}

/// One row of the public listing.
#[derive(Debug, Clone)]
pub struct SecretEntry {
    pub secret: String,
}

const USER_COLUMNS: &str = "id, username, password_hash, google_subject, secret";

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User> {
    User::from_columns(
        row.get("id"),
        row.get("username"),
        row.get("password_hash"),
        row.get("google_subject"),
        row.get("secret"),
    )
}

pub(crate) async fn lookup_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by username")?;

    row.as_ref().map(user_from_row).transpose()
}

pub(crate) async fn lookup_user_by_subject(pool: &PgPool, subject: &str) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE google_subject = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(subject)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by subject")?;

    row.as_ref().map(user_from_row).transpose()
}

/// Insert a local account. A unique violation on the username maps to
/// `Conflict` so registration can answer without a prior existence check.
pub(crate) async fn insert_local_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<InsertOutcome> {
    let query = r"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Insert a federated account holding only the provider subject.
pub(crate) async fn insert_federated_user(pool: &PgPool, subject: &str) -> Result<InsertOutcome> {
    let query = r"
        INSERT INTO users (google_subject)
        VALUES ($1)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(subject)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert federated user"),
    }
}

/// Overwrite the user's secret. Last write wins; returns false when the user
/// row no longer exists.
pub(crate) async fn set_secret(pool: &PgPool, user_id: Uuid, secret: &str) -> Result<bool> {
    let query = r"
        UPDATE users
        SET secret = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(secret)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store secret")?;

    Ok(result.rows_affected() > 0)
}

/// Every secret on record, newest submissions last.
pub(crate) async fn list_secrets(pool: &PgPool) -> Result<Vec<SecretEntry>> {
    let query = r"
        SELECT secret
        FROM users
        WHERE secret IS NOT NULL
        ORDER BY updated_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list secrets")?;

    Ok(rows
        .into_iter()
        .map(|row| SecretEntry {
            secret: row.get("secret"),
        })
        .collect())
}

/// Create a session row and return the raw token for the cookie.
/// The database only ever sees the hash.
pub(crate) async fn insert_session(
    pool: &PgPool,
    user_id: Uuid,
    ttl_seconds: i64,
) -> Result<String> {
    let query = r"
        INSERT INTO user_sessions (user_id, session_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(token_hash)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

/// Resolve a token hash to its user. Expired sessions and sessions whose user
/// row has disappeared both come back as `None`.
pub(crate) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    let query = r"
        SELECT users.id, users.username
        FROM user_sessions
        JOIN users ON users.id = user_sessions.user_id
        WHERE user_sessions.session_hash = $1
          AND user_sessions.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    Ok(row.map(|row| SessionRecord {
        user_id: row.get("id"),
        username: row.get("username"),
    }))
}

/// Logout is idempotent; it's fine if no rows are deleted.
pub(crate) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    let query = "DELETE FROM user_sessions WHERE session_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_outcome_debug_names() {
        assert_eq!(
            format!("{:?}", InsertOutcome::Created(Uuid::nil())),
            format!("Created({})", Uuid::nil())
        );
        assert_eq!(format!("{:?}", InsertOutcome::Conflict), "Conflict");
    }

    #[test]
    fn session_record_holds_values() {
        let record = SessionRecord {
            user_id: Uuid::nil(),
            username: Some("alice".to_string()),
        };
        assert_eq!(record.user_id, Uuid::nil());
        assert_eq!(record.username.as_deref(), Some("alice"));
    }
}
