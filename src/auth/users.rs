//! User directory queries consumed by the session manager.
//!
//! User records are owned by the external user-management surface; this
//! module only reads them, except for the token-version counter which backs
//! mass revocation. The credential hash is fetched separately and never
//! rides along on [`User`], so it cannot leak through response types.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// Directory view of a user, safe to embed in responses and claims.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub token_version: i64,
}

/// Whether an identifier is a well-formed primary id.
///
/// Only non-primary identifiers fall through to the alternate unique keys
/// (email, then username).
#[must_use]
pub fn is_primary_id(identifier: &str) -> bool {
    Uuid::parse_str(identifier.trim()).is_ok()
}

/// Resolve an identifier to a user: primary id when well-formed, otherwise
/// email then username, in that order.
pub async fn find_user_by_identifier(pool: &PgPool, identifier: &str) -> Result<Option<User>> {
    let identifier = identifier.trim();

    if let Ok(id) = Uuid::parse_str(identifier) {
        return find_user(pool, "id = $1::uuid", &id.to_string()).await;
    }

    if let Some(user) = find_user(pool, "email = $1", identifier).await? {
        return Ok(Some(user));
    }
    find_user(pool, "username = $1", identifier).await
}

/// Resolve a user directly by primary id.
pub async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    find_user(pool, "id = $1::uuid", &user_id.to_string()).await
}

async fn find_user(pool: &PgPool, predicate: &str, value: &str) -> Result<Option<User>> {
    let query = format!(
        r"
        SELECT id, username, email, role, COALESCE(token_version, 1) AS token_version
        FROM users
        WHERE {predicate}
        LIMIT 1
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(value)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user")?;

    Ok(row.map(|row| User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        role: row.get("role"),
        token_version: row.get("token_version"),
    }))
}

/// Stored credential digest for a user, if the user still exists.
pub async fn credential_hash(pool: &PgPool, user_id: Uuid) -> Result<Option<String>> {
    let query = "SELECT password_hash FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credential hash")?;
    Ok(row.map(|row| row.get("password_hash")))
}

/// Current token version for a user; `None` when the user is gone.
///
/// A user without a stored version counts as version 1.
pub async fn token_version(pool: &PgPool, user_id: Uuid) -> Result<Option<i64>> {
    let query = "SELECT COALESCE(token_version, 1) AS token_version FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup token version")?;
    Ok(row.map(|row| row.get("token_version")))
}

/// Increment a user's token version, invalidating every outstanding token
/// issued before the bump. Returns the new version.
pub async fn bump_token_version(pool: &PgPool, user_id: Uuid) -> Result<Option<i64>> {
    let query = r"
        UPDATE users
        SET token_version = COALESCE(token_version, 1) + 1
        WHERE id = $1
        RETURNING token_version
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to bump token version")?;
    Ok(row.map(|row| row.get("token_version")))
}
