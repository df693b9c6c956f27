//! Signing and verification of access and refresh tokens.
//!
//! Access and refresh tokens are HS256 JWTs signed with two distinct secrets,
//! so a leaked access secret cannot be used to mint refresh tokens.

use super::{
    errors::{AuthError, AuthResult},
    models::{ClaimPayload, TokenClaims, TokenPair},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

/// Which of the two signing keys a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Secrets and lifetimes for both token kinds
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Config with the default lifetimes: 15 minutes and 7 days
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_secret: refresh_secret.into(),
            refresh_ttl: Duration::days(7),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

#[derive(Clone)]
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn from_secret(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Token signer holding both key sets
#[derive(Clone)]
pub struct TokenSigner {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access: SigningKey::from_secret(&config.access_secret, config.access_ttl),
            refresh: SigningKey::from_secret(&config.refresh_secret, config.refresh_ttl),
            validation,
        }
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign one token of the given kind
    ///
    /// # Errors
    ///
    /// * `AuthError::TokenLifetime` - `now + ttl` does not fit a timestamp
    pub fn sign(&self, payload: &ClaimPayload, kind: TokenKind) -> AuthResult<String> {
        let key = self.key(kind);
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(key.ttl)
            .ok_or(AuthError::TokenLifetime)?;

        let claims = TokenClaims {
            sub: payload.sub,
            email: payload.email.clone(),
            role: payload.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &key.encoding,
        )?)
    }

    /// Sign an access and a refresh token for the same claims.
    ///
    /// The two signatures are independent and are produced concurrently.
    pub async fn sign_tokens(&self, payload: &ClaimPayload) -> AuthResult<TokenPair> {
        let (access_token, refresh_token) = tokio::try_join!(
            async { self.sign(payload, TokenKind::Access) },
            async { self.sign(payload, TokenKind::Refresh) },
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify signature and expiry against the key of `kind`.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidSignature` - Signed with another key or tampered
    /// * `AuthError::TokenExpired` - Past `exp`
    /// * `AuthError::InvalidToken` - Not a decodable token
    pub fn verify(&self, token: &str, kind: TokenKind) -> AuthResult<TokenClaims> {
        let token_data = decode::<TokenClaims>(token, &self.key(kind).decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}
