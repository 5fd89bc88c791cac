//! # Atesti (Token-Pair Authentication Service)
//!
//! `atesti` issues, verifies, rotates, and revokes paired access/refresh
//! tokens bound to client metadata.
//!
//! ## Token Model
//!
//! - **Access tokens** are short-lived `HS256` JWTs, stateless and verified
//!   per request against the owning user's token version.
//! - **Refresh tokens** are long-lived JWTs persisted server-side as an
//!   HMAC-SHA256 fingerprint, rotated on every use. A presented refresh token
//!   is consumed atomically, so a replayed token observes nothing to redeem.
//!
//! ## Revocation
//!
//! Every user carries a monotonic token version embedded in issued claims.
//! Bumping the version invalidates all outstanding tokens for that user on
//! their next verification, without tracking individual access tokens.
//!
//! ## Session Binding
//!
//! Refresh records capture the client IP and user agent seen at issuance and
//! compare them again at redemption. A mismatch is treated as possible token
//! theft; whether it rejects or only logs is a configuration policy.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
