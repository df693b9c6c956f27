//! Authentication middleware for protected endpoints.
//!
//! Three layers guard the router:
//!
//! - [`require_access_token`] verifies an access token and stores its
//!   [`TokenClaims`] in the request extensions
//! - [`require_refresh_token`] verifies a refresh token and stores a
//!   [`RefreshContext`] (claims plus the raw token)
//! - [`require_admin`] runs after `require_access_token` and refuses callers
//!   whose role is not `ADMIN`
//!
//! Handlers read the stored values through the [`CurrentUser`] and
//! [`RefreshSession`] extractors.
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! # use gt_server::api::middleware::{CurrentUser, require_access_token};
//! # use gt_server::api::AppState;
//! # let state: AppState = unimplemented!();
//!
//! async fn whoami(CurrentUser(claims): CurrentUser) -> String {
//!     claims.email
//! }
//!
//! let protected: Router<AppState> = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(middleware::from_fn_with_state(state, require_access_token));
//! # let _ = protected;
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use gym_tracker::auth::{
    Authorization, RefreshContext, Role, TokenClaims, authorize, bearer_token,
};

use super::{AppState, error::ApiError};
use crate::logging::{self, SecurityEvent};

/// Bearer token from the `Authorization` header
fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ApiError::MissingToken)
}

/// Verify the access token and inject its claims.
///
/// Missing, malformed, expired or refresh-signed tokens yield `401`.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())?;
    let claims = state.auth_manager.verify_access_token(token)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Verify the refresh token and inject the refresh context.
pub async fn require_refresh_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())?;
    let context = state.auth_manager.verify_refresh_token(token)?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Refuse callers without the `ADMIN` role.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<TokenClaims>()
        .ok_or(ApiError::MissingToken)?;

    match authorize(claims, &[Role::Admin]) {
        Authorization::Allowed => Ok(next.run(request).await),
        Authorization::Denied(reason) => {
            logging::log_security_event(
                SecurityEvent::Forbidden,
                &claims.email,
                None,
                &reason.to_string(),
            );
            Err(ApiError::Forbidden(reason))
        }
    }
}

/// Claims of the caller, set by [`require_access_token`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub TokenClaims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::MissingToken)
    }
}

/// Verified refresh token of the caller, set by [`require_refresh_token`]
#[derive(Debug, Clone)]
pub struct RefreshSession(pub RefreshContext);

impl<S> FromRequestParts<S> for RefreshSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RefreshContext>()
            .cloned()
            .map(RefreshSession)
            .ok_or(ApiError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert!(matches!(extract_bearer(&headers), Err(ApiError::MissingToken)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_bearer(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer(&headers).is_err());
    }
}
