//! Session lifecycle orchestration: sign-in, rotation, sign-out, revocation.
//!
//! Session state per client:
//! `Anonymous -> Authenticated(access, refresh) -> Authenticated(rotated pair) -> Revoked`.
//!
//! Rotation is irreversible: the presented refresh token is consumed before
//! the new pair is issued, so a caller that vanishes mid-rotation simply
//! re-authenticates. Nothing is rolled back.

use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use super::config::{AuthConfig, BindingPolicy};
use super::error::{AuthError, SessionRefusal};
use super::password;
use super::store;
use super::token::{self, Claims, TokenKind};
use super::users::{self, User};

/// Client metadata captured at issuance and compared at redemption.
#[derive(Clone, Debug, Default)]
pub struct ClientContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// A freshly issued access/refresh pair. The refresh token must only travel
/// over a script-inaccessible channel; the access token goes to the caller.
#[derive(Clone, Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Successful sign-in: the token pair plus the directory view of the user.
#[derive(Clone, Debug)]
pub struct SignedIn {
    pub tokens: IssuedTokens,
    pub user: User,
}

/// Orchestrates the credential verifier, token signer, refresh store, and
/// revocation gate over one pool. All secrets live in the config handed in
/// at construction; there is no global state.
#[derive(Clone)]
pub struct SessionManager {
    pool: PgPool,
    config: AuthConfig,
}

impl SessionManager {
    #[must_use]
    pub fn new(pool: PgPool, config: AuthConfig) -> Self {
        Self { pool, config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Authenticate a user and issue a fresh token pair.
    ///
    /// Unknown identifier and wrong password return the same
    /// `InvalidCredentials`; the caller cannot tell which check failed.
    ///
    /// # Errors
    ///
    /// `BadRequest` for blank input, `InvalidCredentials` on authentication
    /// failure, `Internal` on infrastructure faults.
    pub async fn sign_in(
        &self,
        identifier: &str,
        secret: &str,
        ctx: &ClientContext,
    ) -> Result<SignedIn, AuthError> {
        if identifier.trim().is_empty() || secret.trim().is_empty() {
            return Err(AuthError::BadRequest);
        }

        let Some(user) = users::find_user_by_identifier(&self.pool, identifier).await? else {
            warn!(refusal = SessionRefusal::UnknownIdentifier.as_str(), "sign-in refused");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(digest) = users::credential_hash(&self.pool, user.id).await? else {
            warn!(refusal = SessionRefusal::UnknownIdentifier.as_str(), "sign-in refused");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_secret(&self.config, secret, &digest)? {
            warn!(
                user_id = %user.id,
                refusal = SessionRefusal::PasswordMismatch.as_str(),
                "sign-in refused"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&user, ctx).await?;
        Ok(SignedIn { tokens, user })
    }

    /// Rotate a refresh token: consume the presented one, verify it, and
    /// issue a brand-new pair.
    ///
    /// Every failure mode (absent, reused, expired, rebound, forged, or
    /// version-revoked token) collapses to `InvalidSession`; the specific
    /// cause is only logged.
    ///
    /// # Errors
    ///
    /// `InvalidSession` on any verification failure, `Internal` on
    /// infrastructure faults.
    pub async fn refresh(
        &self,
        raw_refresh: &str,
        ctx: &ClientContext,
    ) -> Result<IssuedTokens, AuthError> {
        if raw_refresh.trim().is_empty() {
            return Err(AuthError::InvalidSession);
        }

        // Consume first: after this point the token is gone even if the new
        // pair never reaches the client. Single-use is enforced here.
        let token_hash = token::fingerprint(&self.config, raw_refresh)?;
        let record = store::take_by_hash(
            &self.pool,
            &token_hash,
            self.config.refresh_ttl_seconds(),
        )
        .await?;

        let Some(record) = record else {
            warn!(
                refusal = SessionRefusal::TokenNotFound.as_str(),
                ip = ctx.ip.as_deref().unwrap_or("-"),
                user_agent = ctx.user_agent.as_deref().unwrap_or("-"),
                "refresh token absent, already rotated, or expired"
            );
            return Err(AuthError::InvalidSession);
        };

        self.check_binding(&record, ctx)?;

        let claims = match token::decode(&self.config, raw_refresh, TokenKind::Refresh) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(
                    user_id = %record.user_id,
                    refusal = SessionRefusal::DecodeFailed.as_str(),
                    "refresh token rejected: {err}"
                );
                return Err(AuthError::InvalidSession);
            }
        };

        // Re-fetch the live version: a bump after issuance invalidates the
        // token even though its signature still verifies.
        let Some(current_version) = users::token_version(&self.pool, claims.id).await? else {
            warn!(refusal = SessionRefusal::UserMissing.as_str(), "refresh refused");
            return Err(AuthError::InvalidSession);
        };
        if current_version != claims.version {
            warn!(
                user_id = %claims.id,
                refusal = SessionRefusal::VersionMismatch.as_str(),
                token_version = claims.version,
                current_version,
                "refresh refused"
            );
            return Err(AuthError::InvalidSession);
        }

        let Some(user) = users::find_user_by_id(&self.pool, claims.id).await? else {
            warn!(refusal = SessionRefusal::UserMissing.as_str(), "refresh refused");
            return Err(AuthError::InvalidSession);
        };

        self.issue_pair(&user, ctx).await
    }

    /// Revoke the presented refresh token. Always succeeds from the caller's
    /// perspective; deletion failures are logged, never surfaced.
    pub async fn sign_out(&self, raw_refresh: Option<&str>) {
        let Some(raw_refresh) = raw_refresh.filter(|raw| !raw.trim().is_empty()) else {
            return;
        };

        match token::fingerprint(&self.config, raw_refresh) {
            Ok(token_hash) => {
                if let Err(err) = store::delete_by_hash(&self.pool, &token_hash).await {
                    error!("failed to delete refresh session on sign-out: {err}");
                }
            }
            Err(err) => error!("failed to fingerprint refresh token on sign-out: {err}"),
        }
    }

    /// Verify an access token and return its claims for downstream
    /// authorization.
    ///
    /// # Errors
    ///
    /// `Unauthorized` on decode failure or a stale token version,
    /// `Internal` on infrastructure faults.
    pub async fn verify_access(&self, raw_access: &str) -> Result<Claims, AuthError> {
        let claims = match token::decode(&self.config, raw_access, TokenKind::Access) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(
                    refusal = SessionRefusal::DecodeFailed.as_str(),
                    "access token rejected: {err}"
                );
                return Err(AuthError::Unauthorized);
            }
        };

        let Some(current_version) = users::token_version(&self.pool, claims.id).await? else {
            warn!(refusal = SessionRefusal::UserMissing.as_str(), "access refused");
            return Err(AuthError::Unauthorized);
        };
        if current_version != claims.version {
            warn!(
                user_id = %claims.id,
                refusal = SessionRefusal::VersionMismatch.as_str(),
                token_version = claims.version,
                current_version,
                "access refused"
            );
            return Err(AuthError::Unauthorized);
        }

        Ok(claims)
    }

    /// Invalidate every outstanding token for a user by bumping their token
    /// version. Returns the new version.
    ///
    /// # Errors
    ///
    /// `BadRequest` when the user does not exist, `Internal` on
    /// infrastructure faults.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<i64, AuthError> {
        let Some(version) = users::bump_token_version(&self.pool, user_id).await? else {
            return Err(AuthError::BadRequest);
        };
        Ok(version)
    }

    async fn issue_pair(&self, user: &User, ctx: &ClientContext) -> Result<IssuedTokens, AuthError> {
        let access_token = token::issue(&self.config, user, TokenKind::Access)?;
        let refresh_token = token::issue(&self.config, user, TokenKind::Refresh)?;

        let token_hash = token::fingerprint(&self.config, &refresh_token)?;
        store::put(
            &self.pool,
            user.id,
            &token_hash,
            ctx.ip.as_deref(),
            ctx.user_agent.as_deref(),
        )
        .await
        .map_err(|err| match err {
            // The jti makes collisions practically impossible; if one shows
            // up anyway, fail the request rather than reuse the row.
            store::StoreError::DuplicateHash => {
                error!("refresh token fingerprint collision");
                AuthError::Internal(anyhow::anyhow!("refresh token fingerprint collision"))
            }
            store::StoreError::Other(err) => AuthError::Internal(err),
        })?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }

    fn check_binding(
        &self,
        record: &store::RefreshSessionRecord,
        ctx: &ClientContext,
    ) -> Result<(), AuthError> {
        let ip_mismatch = record
            .ip
            .as_deref()
            .is_some_and(|expected| ctx.ip.as_deref() != Some(expected));
        let user_agent_mismatch = record
            .user_agent
            .as_deref()
            .is_some_and(|expected| ctx.user_agent.as_deref() != Some(expected));

        if !ip_mismatch && !user_agent_mismatch {
            return Ok(());
        }

        let refusal = if ip_mismatch {
            SessionRefusal::IpMismatch
        } else {
            SessionRefusal::UserAgentMismatch
        };
        warn!(
            user_id = %record.user_id,
            refusal = refusal.as_str(),
            expected_ip = record.ip.as_deref().unwrap_or("-"),
            observed_ip = ctx.ip.as_deref().unwrap_or("-"),
            expected_user_agent = record.user_agent.as_deref().unwrap_or("-"),
            observed_user_agent = ctx.user_agent.as_deref().unwrap_or("-"),
            "refresh token binding mismatch"
        );

        match self.config.binding_policy() {
            BindingPolicy::Enforce => Err(AuthError::InvalidSession),
            BindingPolicy::Advisory => Ok(()),
        }
    }
}
