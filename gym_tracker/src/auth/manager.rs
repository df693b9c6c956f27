//! Authentication manager implementation.
//!
//! Session state lives in a single column: `hashed_refresh_token` is `None`
//! while logged out and holds the hash of the one valid refresh token while
//! logged in. Login, registration and refresh all overwrite it, which is what
//! invalidates older refresh tokens.

use super::{
    errors::{AuthError, AuthResult},
    hasher::SecretHasher,
    models::{LoginRequest, NewUser, RefreshContext, RegisterRequest, Role, TokenClaims, TokenPair, User},
    tokens::{TokenKind, TokenSigner},
    validation,
};
use crate::db::UserRepository;
use std::sync::Arc;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    hasher: SecretHasher,
    signer: TokenSigner,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - User store
    /// * `hasher` - Hasher for passwords and refresh tokens
    /// * `signer` - Access/refresh token signer
    pub fn new(users: Arc<dyn UserRepository>, hasher: SecretHasher, signer: TokenSigner) -> Self {
        Self {
            users,
            hasher,
            signer,
        }
    }

    /// Register a new user and open its first session
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - A field failed validation
    /// * `AuthError::EmailTaken` - Email already exists
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<TokenPair> {
        validation::validate_register(&request)?;

        let hashed_password = self.hasher.hash(&request.password).await?;
        let user = self
            .users
            .create(NewUser {
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                role: Role::User,
                hashed_password,
            })
            .await?;

        log::info!("Registered user {}", user.id);

        self.issue_session(&user).await
    }

    /// Login a user
    ///
    /// The password check runs even when the email is unknown, so both
    /// failures take the same time and return the same error.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown email or wrong password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<TokenPair> {
        let user = self.users.find_by_email(&request.email).await?;

        let password_matches = self
            .hasher
            .verify_or_dummy(
                user.as_ref().map(|u| u.hashed_password.as_str()),
                &request.password,
            )
            .await?;

        let user = match user {
            Some(user) if password_matches => user,
            _ => {
                log::warn!("Rejected login attempt");
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.issue_session(&user).await
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// The presented token must match the stored hash. On success the stored
    /// hash is replaced, so the presented token can never be used again.
    ///
    /// # Errors
    ///
    /// * `AuthError::AccessDenied` - Unknown email, no active session, or the
    ///   token is not the current one
    pub async fn refresh_tokens(&self, email: &str, refresh_token: &str) -> AuthResult<TokenPair> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccessDenied)?;

        let Some(ref stored_hash) = user.hashed_refresh_token else {
            return Err(AuthError::AccessDenied);
        };

        if !self.hasher.verify(stored_hash, refresh_token).await? {
            log::warn!("Rejected stale or unknown refresh token for user {}", user.id);
            return Err(AuthError::AccessDenied);
        }

        self.issue_session(&user).await
    }

    /// Logout user by clearing its refresh token hash
    ///
    /// Idempotent: logging out without an active session succeeds.
    pub async fn logout(&self, email: &str) -> AuthResult<()> {
        self.users.clear_refresh_hash(email).await
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<TokenClaims> {
        self.signer.verify(token, TokenKind::Access)
    }

    /// Verify a refresh token's signature and expiry, keeping the raw value
    /// for the hash comparison done by [`AuthManager::refresh_tokens`]
    pub fn verify_refresh_token(&self, token: &str) -> AuthResult<RefreshContext> {
        let claims = self.signer.verify(token, TokenKind::Refresh)?;
        Ok(RefreshContext {
            claims,
            refresh_token: token.to_string(),
        })
    }

    /// User store shared with this manager
    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    /// Hasher shared with this manager
    pub fn hasher(&self) -> &SecretHasher {
        &self.hasher
    }

    /// Sign a fresh pair and make its refresh token the only valid one
    async fn issue_session(&self, user: &User) -> AuthResult<TokenPair> {
        let tokens = self.signer.sign_tokens(&user.claim_payload()).await?;

        let refresh_hash = self.hasher.hash(&tokens.refresh_token).await?;
        self.users.update_refresh_hash(user.id, &refresh_hash).await?;

        Ok(tokens)
    }
}
