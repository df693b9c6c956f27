//! JSON error responses.
//!
//! Every failure leaves the server as `{"statusCode": <u16>, "message": <string>}`.
//! Internal failures are logged in full and reported with a generic message.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gym_tracker::auth::{AuthError, DenyReason, ErrorKind};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
}

/// Error returned by handlers and middleware
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated but not permitted
    #[error("Forbidden: {0}")]
    Forbidden(DenyReason),

    /// No usable bearer token on the request
    #[error("Missing bearer token")]
    MissingToken,

    /// Request body is not the expected JSON
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(err) => match err.kind() {
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Auth(err) => err.client_message(),
            ApiError::Forbidden(_) => "Forbidden resource".to_string(),
            ApiError::MissingToken => "Access denied".to_string(),
            ApiError::MalformedBody(detail) => detail.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            status_code: status.as_u16(),
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gym_tracker::auth::Role;
    use http_body_util::BodyExt;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_body() {
        let (status, body) = body_of(AuthError::EmailTaken.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["statusCode"], 409);
        assert_eq!(body["message"], "Email already exists");
    }

    #[tokio::test]
    async fn test_token_errors_are_generic() {
        let (status, body) = body_of(AuthError::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied");

        let (status, body) = body_of(ApiError::MissingToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied");
    }

    #[tokio::test]
    async fn test_internal_errors_hide_detail() {
        let err = AuthError::HashingFailed("argon2 exploded at 0xdeadbeef".to_string());
        let (status, body) = body_of(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["statusCode"], 500);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (status, body) = body_of(ApiError::MalformedBody("missing field `email`".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["message"], "missing field `email`");
    }

    #[tokio::test]
    async fn test_forbidden() {
        let reason = DenyReason::InsufficientRole {
            required: vec![Role::Admin],
            actual: Role::User,
        };
        let (status, body) = body_of(ApiError::Forbidden(reason)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["statusCode"], 403);
        assert_eq!(body["message"], "Forbidden resource");
    }
}
