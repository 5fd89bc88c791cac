//! Auth endpoints: sign-in, sign-out, refresh rotation, and access checks.
//!
//! This layer only moves tokens between transport and core. The refresh
//! token lives in an `HttpOnly` cookie; the access token is returned in the
//! body and presented back as a bearer header. Core failures arrive as
//! [`AuthError`] values and are mapped to status codes here.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use super::types::{RefreshResponse, SessionResponse, SignInRequest, SignInResponse};
use super::utils::{
    clear_refresh_cookie, client_context, extract_bearer_token, extract_refresh_token,
    refresh_cookie,
};
use crate::auth::{AuthError, SessionManager};

pub async fn signin(
    headers: HeaderMap,
    manager: Extension<SessionManager>,
    payload: Option<Json<SignInRequest>>,
) -> impl IntoResponse {
    let request: SignInRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let (Some(identifier), Some(password)) = (request.identifier(), request.password.as_deref())
    else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing username or password.".to_string(),
        )
            .into_response();
    };

    let ctx = client_context(&headers);
    match manager.sign_in(identifier, password, &ctx).await {
        Ok(signed_in) => {
            let mut response_headers = HeaderMap::new();
            match refresh_cookie(manager.config(), &signed_in.tokens.refresh_token) {
                Ok(cookie) => {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => {
                    error!("failed to build refresh cookie: {err}");
                    return internal_response();
                }
            }

            let body = SignInResponse {
                access_token: signed_in.tokens.access_token,
                user: signed_in.user,
            };
            (StatusCode::OK, response_headers, Json(body)).into_response()
        }
        Err(err) => auth_error_response("sign-in", &err),
    }
}

pub async fn refresh(headers: HeaderMap, manager: Extension<SessionManager>) -> impl IntoResponse {
    let Some(raw_refresh) = extract_refresh_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "No refresh token".to_string()).into_response();
    };

    let ctx = client_context(&headers);
    match manager.refresh(&raw_refresh, &ctx).await {
        Ok(tokens) => {
            let mut response_headers = HeaderMap::new();
            match refresh_cookie(manager.config(), &tokens.refresh_token) {
                Ok(cookie) => {
                    response_headers.insert(SET_COOKIE, cookie);
                }
                Err(err) => {
                    error!("failed to build refresh cookie: {err}");
                    return internal_response();
                }
            }

            let body = RefreshResponse {
                access_token: tokens.access_token,
            };
            (StatusCode::OK, response_headers, Json(body)).into_response()
        }
        Err(err) => auth_error_response("refresh", &err),
    }
}

/// Sign-out never fails outward: the cookie is cleared and 200 returned
/// whether or not a stored session existed or could be deleted.
pub async fn signout(headers: HeaderMap, manager: Extension<SessionManager>) -> impl IntoResponse {
    let raw_refresh = extract_refresh_token(&headers);
    manager.sign_out(raw_refresh.as_deref()).await;

    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_refresh_cookie(manager.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(json!({ "message": "Signout successful." })),
    )
        .into_response()
}

pub async fn session(headers: HeaderMap, manager: Extension<SessionManager>) -> impl IntoResponse {
    let Some(raw_access) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Access token missing".to_string()).into_response();
    };

    match manager.verify_access(&raw_access).await {
        Ok(claims) => {
            let body = SessionResponse {
                user_id: claims.id.to_string(),
                username: claims.username,
                role: claims.role,
                version: claims.version,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => auth_error_response("access verification", &err),
    }
}

fn auth_error_response(operation: &str, err: &AuthError) -> Response {
    if let AuthError::Internal(inner) = err {
        error!("{operation} failed: {inner:?}");
    }

    let (status, message) = match err {
        AuthError::BadRequest => (
            StatusCode::BAD_REQUEST,
            "Missing username or password.".to_string(),
        ),
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password.".to_string(),
        ),
        AuthError::InvalidSession => {
            (StatusCode::PAYMENT_REQUIRED, "Invalid session.".to_string())
        }
        AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        AuthError::Internal(_) => {
            return internal_response();
        }
    };
    (status, message).into_response()
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong. Please try again later.".to_string(),
    )
        .into_response()
}
