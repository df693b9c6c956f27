//! # Gym Tracker
//!
//! Users and authentication core of the Gym Tracker API.
//!
//! ## Core Modules
//!
//! - [`auth`]: Secret hashing, token signing and the session manager that
//!   ties one valid refresh token to each user
//! - [`db`]: Connection pooling and the [`db::UserRepository`] store seam
//! - [`users`]: Profile lookups and self-service updates
//!
//! The HTTP surface lives in the `gt_server` crate.

/// Authentication: hashing, tokens, sessions and guards.
pub mod auth;

/// Persistence: pool, migrations and user repositories.
pub mod db;

/// User profile service.
pub mod users;

pub use auth::{AuthError, AuthManager, AuthResult};
pub use users::UserService;
