//! Authorization decisions over verified token claims.

use super::models::{Role, TokenClaims};
use std::fmt;

/// Why a request was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    InsufficientRole { required: Vec<Role>, actual: Role },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::InsufficientRole { required, actual } => {
                let required: Vec<&str> = required.iter().map(Role::as_str).collect();
                write!(f, "role {actual} is not one of [{}]", required.join(", "))
            }
        }
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied(DenyReason),
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed)
    }
}

/// Allow when no role is required or the claims carry one of `required`
pub fn authorize(claims: &TokenClaims, required: &[Role]) -> Authorization {
    if required.is_empty() || required.contains(&claims.role) {
        Authorization::Allowed
    } else {
        Authorization::Denied(DenyReason::InsufficientRole {
            required: required.to_vec(),
            actual: claims.role,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
