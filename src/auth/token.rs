//! JWT issuance and verification for the access/refresh token pair.
//!
//! Both kinds are `HS256` with their own signing secret and lifetime. The
//! decoder pins the algorithm, so a token re-signed under a different
//! algorithm (including `none`) is rejected rather than interpreted.
//!
//! Refresh tokens additionally carry a ULID `jti` so that two issuances for
//! the same user in the same second never collide, and are fingerprinted
//! with keyed HMAC-SHA256 before touching the database. The raw token is
//! never persisted.

use anyhow::Context;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use ulid::Ulid;
use uuid::Uuid;

use super::config::AuthConfig;
use super::error::AuthError;
use super::users::User;

type HmacSha256 = Hmac<Sha256>;

/// Token kind, each with its own secret and expiry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Minimal claim set embedded in every issued token.
///
/// The raw credential is never part of the claims; `version` snapshots the
/// user's token version at issuance for the revocation check.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Claims {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub version: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Normalized decode failure; library error detail stays internal.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// Sign a token of the given kind for a user.
///
/// # Errors
///
/// `Internal` when claim serialization or signing fails.
pub fn issue(config: &AuthConfig, user: &User, kind: TokenKind) -> Result<String, AuthError> {
    let claims = Claims {
        id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
        version: user.token_version,
        exp: Utc::now().timestamp() + ttl_seconds(config, kind),
        // Entropy for refresh tokens; access tokens stay minimal.
        jti: matches!(kind, TokenKind::Refresh).then(|| Ulid::new().to_string()),
    };

    let key = EncodingKey::from_secret(secret(config, kind).expose_secret().as_bytes());
    let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .context("failed to sign token")?;
    Ok(token)
}

/// Decode and validate a token of the given kind.
///
/// # Errors
///
/// `InvalidSignature` for bad or foreign-algorithm signatures, `Expired`
/// past the signed expiry, `Malformed` for anything that does not parse.
pub fn decode(config: &AuthConfig, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret(config, kind).expose_secret().as_bytes());
    // Validation::new pins the accepted algorithm set to HS256 only.
    let validation = Validation::new(Algorithm::HS256);

    let data = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|err| {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    })?;
    Ok(data.claims)
}

/// Keyed fingerprint of a raw refresh token, the only form that is stored.
///
/// # Errors
///
/// `Internal` when the HMAC cannot be keyed.
pub fn fingerprint(config: &AuthConfig, token: &str) -> Result<Vec<u8>, AuthError> {
    let mut mac =
        HmacSha256::new_from_slice(config.token_hash_secret().expose_secret().as_bytes())
            .context("failed to key token fingerprint")?;
    mac.update(token.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn secret(config: &AuthConfig, kind: TokenKind) -> &SecretString {
    match kind {
        TokenKind::Access => config.access_secret(),
        TokenKind::Refresh => config.refresh_secret(),
    }
}

fn ttl_seconds(config: &AuthConfig, kind: TokenKind) -> i64 {
    match kind {
        TokenKind::Access => config.access_ttl_seconds(),
        TokenKind::Refresh => config.refresh_ttl_seconds(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Claims, TokenKind, decode, fingerprint, issue};
    use crate::auth::config::AuthConfig;
    use crate::auth::users::User;
    use anyhow::Result;
    use chrono::Utc;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use secrecy::SecretString;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("access-secret"),
            SecretString::from("refresh-secret"),
            SecretString::from("hash-secret"),
            SecretString::from("pepper"),
        )
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: "user".to_string(),
            token_version: 1,
        }
    }

    #[test]
    fn issue_then_decode_round_trips() -> Result<()> {
        let config = config();
        let user = user();

        let token = issue(&config, &user, TokenKind::Access)?;
        let claims = decode(&config, &token, TokenKind::Access)?;

        assert_eq!(claims.id, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.version, 1);
        assert!(claims.exp > Utc::now().timestamp());
        assert_eq!(claims.jti, None);
        Ok(())
    }

    #[test]
    fn refresh_tokens_carry_a_jti() -> Result<()> {
        let config = config();
        let user = user();

        let first = issue(&config, &user, TokenKind::Refresh)?;
        let second = issue(&config, &user, TokenKind::Refresh)?;
        // Same user, same second: the jti keeps the tokens distinct.
        assert_ne!(first, second);

        let claims = decode(&config, &first, TokenKind::Refresh)?;
        assert!(claims.jti.is_some());
        Ok(())
    }

    #[test]
    fn kinds_do_not_cross_validate() -> Result<()> {
        let config = config();
        let token = issue(&config, &user(), TokenKind::Access)?;
        assert!(decode(&config, &token, TokenKind::Refresh).is_err());
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<()> {
        // Far enough in the past to clear the default validation leeway.
        let config = config().with_access_ttl_seconds(-3600);
        let token = issue(&config, &user(), TokenKind::Access)?;
        let err = decode(&config, &token, TokenKind::Access).unwrap_err();
        assert_eq!(err.to_string(), "token expired");
        Ok(())
    }

    #[test]
    fn foreign_algorithm_is_rejected() -> Result<()> {
        let config = config();
        let claims = Claims {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            role: "user".to_string(),
            version: 1,
            exp: Utc::now().timestamp() + 60,
            jti: None,
        };
        // Same secret, different algorithm: must not validate.
        let key = EncodingKey::from_secret(b"access-secret");
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS384), &claims, &key)?;
        assert!(decode(&config, &token, TokenKind::Access).is_err());
        Ok(())
    }

    #[test]
    fn garbage_is_malformed() {
        let config = config();
        let err = decode(&config, "not.a.token", TokenKind::Access).unwrap_err();
        assert_eq!(err.to_string(), "malformed token");
    }

    #[test]
    fn fingerprint_is_stable_and_keyed() -> Result<()> {
        let config = config();
        let first = fingerprint(&config, "token")?;
        let second = fingerprint(&config, "token")?;
        let different = fingerprint(&config, "other")?;
        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 32);

        let other_key = AuthConfig::new(
            SecretString::from("access-secret"),
            SecretString::from("refresh-secret"),
            SecretString::from("another-hash-secret"),
            SecretString::from("pepper"),
        );
        assert_ne!(fingerprint(&other_key, "token")?, first);
        Ok(())
    }
}
