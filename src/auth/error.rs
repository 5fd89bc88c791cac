//! Outward-facing error taxonomy for the auth core.
//!
//! Callers only ever see the coarse variants below. The specific cause of a
//! sign-in or refresh failure (unknown user vs. wrong password, reused vs.
//! expired vs. rebound token) is logged server-side via [`SessionRefusal`]
//! and deliberately not distinguishable from the returned value, to resist
//! account enumeration and token probing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed caller input (missing or blank fields).
    #[error("bad request")]
    BadRequest,
    /// Sign-in failed. Covers unknown identifier and wrong password alike.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// Refresh failed. Covers missing, expired, reused, rebound, and forged
    /// tokens alike.
    #[error("invalid session")]
    InvalidSession,
    /// Access-token verification failed.
    #[error("unauthorized")]
    Unauthorized,
    /// Store or signing infrastructure fault; no detail is exposed.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Internal-only diagnostics for refused sessions, used in log lines.
///
/// Never returned to callers; every variant maps to the same outward
/// [`AuthError`] for its flow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionRefusal {
    UnknownIdentifier,
    PasswordMismatch,
    TokenNotFound,
    IpMismatch,
    UserAgentMismatch,
    DecodeFailed,
    VersionMismatch,
    UserMissing,
}

impl SessionRefusal {
    /// Stable label for structured log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownIdentifier => "unknown_identifier",
            Self::PasswordMismatch => "password_mismatch",
            Self::TokenNotFound => "token_not_found",
            Self::IpMismatch => "ip_mismatch",
            Self::UserAgentMismatch => "user_agent_mismatch",
            Self::DecodeFailed => "decode_failed",
            Self::VersionMismatch => "version_mismatch",
            Self::UserMissing => "user_missing",
        }
    }
}
