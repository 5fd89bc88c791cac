//! Refresh session persistence.
//!
//! One row per live refresh token, keyed by its HMAC fingerprint; the raw
//! token never reaches the database. Consumption is a single
//! `DELETE ... RETURNING`, so two requests racing on the same fingerprint
//! cannot both redeem it: exactly one observes the row. That atomicity is
//! the replay defense, not an optimization.
//!
//! Rows also age out passively: `take_by_hash` refuses rows older than the
//! refresh lifetime even if the background sweeper has not removed them yet.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{Instrument, debug, error};
use uuid::Uuid;

/// A consumed refresh session row.
#[derive(Clone, Debug)]
pub struct RefreshSessionRecord {
    pub user_id: Uuid,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at_unix: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The fingerprint already exists. Vanishingly unlikely given token
    /// entropy, but surfaced rather than swallowed.
    #[error("duplicate token hash")]
    DuplicateHash,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persist a refresh session keyed by its token fingerprint.
pub async fn put(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &[u8],
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<(), StoreError> {
    let query = r"
        INSERT INTO refresh_sessions (user_id, token_hash, ip, user_agent)
        VALUES ($1, $2, $3, $4)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .bind(ip)
        .bind(user_agent)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateHash),
        Err(err) => Err(StoreError::Other(
            anyhow::Error::new(err).context("failed to insert refresh session"),
        )),
    }
}

/// Atomically read and delete the session for a fingerprint.
///
/// Returns `None` when the row is absent (never issued, already consumed,
/// or swept) or older than `ttl_seconds`. An expired row is still removed
/// by the delete; it just no longer counts as a live session.
pub async fn take_by_hash(
    pool: &PgPool,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<Option<RefreshSessionRecord>> {
    let query = r"
        DELETE FROM refresh_sessions
        WHERE token_hash = $1
        RETURNING
            user_id,
            ip,
            user_agent,
            EXTRACT(EPOCH FROM created_at)::bigint AS created_at_unix,
            created_at > NOW() - ($2 * INTERVAL '1 second') AS live
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .bind(ttl_seconds)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to take refresh session")?;

    let Some(row) = row else {
        return Ok(None);
    };

    if !row.get::<bool, _>("live") {
        return Ok(None);
    }

    Ok(Some(RefreshSessionRecord {
        user_id: row.get("user_id"),
        ip: row.get("ip"),
        user_agent: row.get("user_agent"),
        created_at_unix: row.get("created_at_unix"),
    }))
}

/// Remove the session for a fingerprint. Idempotent: zero rows is success.
pub async fn delete_by_hash(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    let query = "DELETE FROM refresh_sessions WHERE token_hash = $1";
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
        .context("failed to delete refresh session")?;
    Ok(())
}

/// Delete every session past the refresh lifetime; returns rows removed.
pub async fn sweep_expired(pool: &PgPool, ttl_seconds: i64) -> Result<u64> {
    let query = r"
        DELETE FROM refresh_sessions
        WHERE created_at <= NOW() - ($1 * INTERVAL '1 second')
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to sweep expired refresh sessions")?;
    Ok(result.rows_affected())
}

/// Spawn the background task that periodically removes expired sessions.
///
/// The sweep only deletes; it never feeds business logic, so a failed pass
/// is logged and retried on the next tick.
pub fn spawn_expiry_sweeper(
    pool: PgPool,
    ttl_seconds: i64,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match sweep_expired(&pool, ttl_seconds).await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "swept expired refresh sessions"),
                Err(err) => error!("refresh session sweep failed: {err}"),
            }

            sleep(interval).await;
        }
    })
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
