//! Authentication API handlers.
//!
//! - `POST /auth/register` creates a `USER` account and starts its session
//! - `POST /auth/login` starts a new session, replacing any previous one
//! - `GET /auth/logout` ends the caller's session (access token)
//! - `GET /auth/refresh-tokens` rotates the token pair (refresh token)
//!
//! # Examples
//!
//! ```bash
//! curl -X POST http://localhost:3000/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"firstName": "Ada", "email": "a@b.com", "password": "Str0ng!Pass"}'
//!
//! curl -X POST http://localhost:3000/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@b.com", "password": "Str0ng!Pass"}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use gym_tracker::auth::{AuthError, LoginRequest, RegisterRequest, TokenPair};

use super::{
    ApiJson, AppState,
    error::ApiError,
    middleware::{CurrentUser, RefreshSession},
    request_id::RequestId,
};
use crate::{
    logging::{self, SecurityEvent},
    metrics::{self, AuthFlow},
};

/// Register a new account and return its first token pair.
///
/// # Response
///
/// `201 Created` with `{"accessToken": "...", "refreshToken": "..."}`
///
/// # Errors
///
/// - `400 Bad Request`: Invalid name, email or weak password
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenPair>), ApiError> {
    let result = state.auth_manager.register(request).await;
    metrics::auth_attempt(AuthFlow::Register, result.is_ok());

    Ok((StatusCode::CREATED, Json(result?)))
}

/// Authenticate with email and password.
///
/// Unknown emails and wrong passwords produce the same `401` with the same
/// message.
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let email = request.email.clone();

    match state.auth_manager.login(request).await {
        Ok(tokens) => {
            metrics::auth_attempt(AuthFlow::Login, true);
            Ok(Json(tokens))
        }
        Err(err) => {
            metrics::auth_attempt(AuthFlow::Login, false);
            if matches!(err, AuthError::InvalidCredentials) {
                logging::log_security_event(
                    SecurityEvent::FailedLogin,
                    &email,
                    Some(request_id.as_str()),
                    "Invalid credentials",
                );
            }
            Err(err.into())
        }
    }
}

/// Invalidate the caller's refresh token. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<StatusCode, ApiError> {
    state.auth_manager.logout(&claims.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Exchange the presented refresh token for a new pair.
///
/// The presented token stops working once this returns.
pub async fn refresh_tokens(
    State(state): State<AppState>,
    request_id: RequestId,
    RefreshSession(context): RefreshSession,
) -> Result<Json<TokenPair>, ApiError> {
    let email = &context.claims.email;

    match state
        .auth_manager
        .refresh_tokens(email, &context.refresh_token)
        .await
    {
        Ok(tokens) => {
            metrics::auth_attempt(AuthFlow::Refresh, true);
            Ok(Json(tokens))
        }
        Err(err) => {
            metrics::auth_attempt(AuthFlow::Refresh, false);
            if matches!(err, AuthError::AccessDenied) {
                logging::log_security_event(
                    SecurityEvent::RefreshRejected,
                    email,
                    Some(request_id.as_str()),
                    "Refresh token is not the active one",
                );
            }
            Err(err.into())
        }
    }
}
