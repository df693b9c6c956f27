//! Authentication error types.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Hashing or hash-task failure
    #[error("Hashing failed: {0}")]
    HashingFailed(String),

    /// Login rejected: unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh rejected: no session, unknown identity or stale refresh token
    #[error("Access denied")]
    AccessDenied,

    /// User not found on a direct lookup
    #[error("User not found")]
    UserNotFound,

    /// Email already exists
    #[error("Email already exists")]
    EmailTaken,

    /// Input rejected before reaching the store
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Token signed with another key or tampered with
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token past its expiry
    #[error("Token expired")]
    TokenExpired,

    /// Token could not be decoded at all
    #[error("Invalid token")]
    InvalidToken,

    /// Configured lifetime pushes `exp` past the representable range
    #[error("Token lifetime out of range")]
    TokenLifetime,

    /// Any other JWT failure (encoding, key problems)
    #[error("JWT error: {0}")]
    Jwt(jsonwebtoken::errors::Error),

    /// Blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Coarse classification used by callers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Conflict,
    NotFound,
    BadRequest,
    Internal,
}

impl AuthError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::AccessDenied
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidToken => ErrorKind::Unauthorized,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Database(_)
            | AuthError::HashingFailed(_)
            | AuthError::TokenLifetime
            | AuthError::Jwt(_)
            | AuthError::Task(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Internal failures are collapsed into one generic message. Token
    /// failures are collapsed into "Access denied" so a caller cannot tell a
    /// forged token from an expired one.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            ErrorKind::Unauthorized if !matches!(self, AuthError::InvalidCredentials) => {
                AuthError::AccessDenied.to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
            JwtErrorKind::InvalidSignature => AuthError::InvalidSignature,
            JwtErrorKind::InvalidToken
            | JwtErrorKind::Base64(_)
            | JwtErrorKind::Json(_)
            | JwtErrorKind::InvalidAlgorithm
            | JwtErrorKind::MissingRequiredClaim(_)
            | JwtErrorKind::ImmatureSignature => AuthError::InvalidToken,
            _ => AuthError::Jwt(err),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
