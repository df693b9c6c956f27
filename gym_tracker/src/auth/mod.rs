//! Authentication module providing registration, login, logout and
//! refresh-token rotation.
//!
//! This module implements:
//! - Argon2id hashing of passwords and refresh tokens
//! - Uniform-latency login failures (unknown email and wrong password both
//!   pay for one Argon2 verification)
//! - JWT access tokens (15-minute default expiry) and refresh tokens (7-day
//!   default expiry) signed with distinct secrets
//! - Single active session per user: each login/refresh overwrites the stored
//!   refresh hash, invalidating the previous refresh token
//!
//! ## Example
//!
//! ```no_run
//! use gym_tracker::auth::{
//!     AuthManager, HasherConfig, LoginRequest, RegisterRequest, SecretHasher, TokenConfig,
//!     TokenSigner,
//! };
//! use gym_tracker::db::MemoryUserRepository;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthManager::new(
//!         Arc::new(MemoryUserRepository::new()),
//!         SecretHasher::new(HasherConfig::default())?,
//!         TokenSigner::new(&TokenConfig::new("access-secret", "refresh-secret")),
//!     );
//!
//!     auth.register(RegisterRequest {
//!         first_name: "Ada".to_string(),
//!         last_name: None,
//!         email: "a@b.com".to_string(),
//!         password: "Str0ng!Pass".to_string(),
//!     })
//!     .await?;
//!
//!     let tokens = auth
//!         .login(LoginRequest {
//!             email: "a@b.com".to_string(),
//!             password: "Str0ng!Pass".to_string(),
//!         })
//!         .await?;
//!     let rotated = auth.refresh_tokens("a@b.com", &tokens.refresh_token).await?;
//!     println!("new access token: {}", rotated.access_token);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod guards;
pub mod hasher;
pub mod manager;
pub mod models;
pub mod tokens;
pub mod validation;

pub use errors::{AuthError, AuthResult, ErrorKind};
pub use guards::{Authorization, DenyReason, authorize, bearer_token};
pub use hasher::{HasherConfig, SecretHasher};
pub use manager::AuthManager;
pub use models::{
    ClaimPayload, LoginRequest, NewUser, ProfileUpdate, RefreshContext, RegisterRequest, Role,
    TokenClaims, TokenPair, UpdateUserRequest, User, UserId, UserProfile,
};
pub use tokens::{TokenConfig, TokenKind, TokenSigner};
