//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};

use crate::auth::users::User;

/// Sign-in body. The identifier may arrive under `email`, `username`, or
/// `id`; the first present key wins, in that order.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub id: Option<String>,
    pub password: Option<String>,
}

impl SignInRequest {
    /// The identifier to authenticate with, if any non-blank one was sent.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        [&self.email, &self.username, &self.id]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

/// Sign-in response body. The refresh token is not here: it travels only in
/// the `HttpOnly` cookie.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub user: User,
}

/// Rotation response body; the new refresh token rides the cookie.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Verified access-token claims, for downstream authorization.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub version: i64,
}

#[cfg(test)]
mod tests {
    use super::SignInRequest;
    use anyhow::Result;

    #[test]
    fn identifier_prefers_email_then_username_then_id() {
        let request = SignInRequest {
            email: Some("alice@example.com".to_string()),
            username: Some("alice".to_string()),
            id: Some("42".to_string()),
            password: None,
        };
        assert_eq!(request.identifier(), Some("alice@example.com"));

        let request = SignInRequest {
            email: None,
            username: Some("alice".to_string()),
            id: Some("42".to_string()),
            password: None,
        };
        assert_eq!(request.identifier(), Some("alice"));

        let request = SignInRequest {
            id: Some("42".to_string()),
            ..SignInRequest::default()
        };
        assert_eq!(request.identifier(), Some("42"));
    }

    #[test]
    fn blank_fields_do_not_count_as_identifiers() {
        let request = SignInRequest {
            email: Some("   ".to_string()),
            username: Some("alice".to_string()),
            ..SignInRequest::default()
        };
        assert_eq!(request.identifier(), Some("alice"));

        assert_eq!(SignInRequest::default().identifier(), None);
    }

    #[test]
    fn sign_in_request_deserializes_partial_bodies() -> Result<()> {
        let request: SignInRequest =
            serde_json::from_str(r#"{"username": "alice", "password": "Secr3t!"}"#)?;
        assert_eq!(request.identifier(), Some("alice"));
        assert_eq!(request.password.as_deref(), Some("Secr3t!"));
        Ok(())
    }
}
