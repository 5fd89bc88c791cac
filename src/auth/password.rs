//! Credential hashing and verification.
//!
//! Secrets are combined with a server-side pepper before bcrypt, so a stolen
//! database alone is not enough to mount an offline attack. The pepper is
//! distinct from bcrypt's per-record salt, which is embedded in the digest.

use anyhow::Context;
use secrecy::ExposeSecret;

use super::config::AuthConfig;
use super::error::AuthError;

/// Hash a secret with the configured pepper and bcrypt cost.
///
/// # Errors
///
/// `BadRequest` when the secret is empty or whitespace-only; `Internal` when
/// the underlying hash primitive fails.
pub fn hash_secret(config: &AuthConfig, secret: &str) -> Result<String, AuthError> {
    if secret.trim().is_empty() {
        return Err(AuthError::BadRequest);
    }

    let peppered = peppered(config, secret);
    let digest = bcrypt::hash(peppered, config.bcrypt_cost())
        .context("failed to hash credential")?;
    Ok(digest)
}

/// Verify a secret against a stored digest.
///
/// A mismatch is `Ok(false)`, never an error; only malformed input or a
/// corrupt digest produce one. Comparison timing is governed by bcrypt
/// itself, which recomputes the full digest before comparing.
///
/// # Errors
///
/// `BadRequest` when the secret is empty; `Internal` when the stored digest
/// cannot be parsed.
pub fn verify_secret(config: &AuthConfig, secret: &str, digest: &str) -> Result<bool, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::BadRequest);
    }

    let peppered = peppered(config, secret);
    let matched = bcrypt::verify(peppered, digest)
        .context("failed to verify credential against stored digest")?;
    Ok(matched)
}

fn peppered(config: &AuthConfig, secret: &str) -> String {
    format!("{}{}", config.pepper().expose_secret(), secret)
}
