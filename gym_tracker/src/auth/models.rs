//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// User ID type
pub type UserId = Uuid;

/// Access level carried by every identity and embedded in its tokens.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User model
///
/// `hashed_refresh_token` is `None` while no session is active. Otherwise it
/// holds the Argon2 hash of the only refresh token that may be exchanged.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub role: Role,
    pub hashed_password: String,
    pub hashed_refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_active_session(&self) -> bool {
        self.hashed_refresh_token.is_some()
    }

    /// Claims embedded into this user's tokens
    pub fn claim_payload(&self) -> ClaimPayload {
        ClaimPayload {
            sub: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Fields needed to insert a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub role: Role,
    pub hashed_password: String,
}

/// Partial profile update; `None` leaves the column untouched.
///
/// `last_name` is nullable, so `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<Option<String>>,
    pub hashed_password: Option<String>,
}

/// Public view of a user. Never carries secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request as sent by the user.
///
/// An absent `lastName` keeps the stored value; `"lastName": null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<Option<String>>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Wraps any present value, including `null`, in `Some`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Access and refresh token issued together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity fields signed into both tokens.
///
/// `sub` pins the token to one account, so a token outlives neither the
/// deletion of its account nor a later re-registration of the same email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPayload {
    pub sub: UserId,
    pub email: String,
    pub role: Role,
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,
    pub email: String,
    pub role: Role,
    pub jti: String, // Unique per token, keeps same-second tokens distinct
    pub iat: i64,    // Issued at timestamp
    pub exp: i64,    // Expiration timestamp
}

impl TokenClaims {
    pub fn payload(&self) -> ClaimPayload {
        ClaimPayload {
            sub: self.sub,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Verified refresh token together with its raw value, which is compared
/// against the stored hash during rotation.
#[derive(Debug, Clone)]
pub struct RefreshContext {
    pub claims: TokenClaims,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Test".to_string(),
            last_name: Some("Test".to_string()),
            email: "test@test.com".to_string(),
            role: Role::User,
            hashed_password: "mock-hashed-password".to_string(),
            hashed_refresh_token: Some("mock-hashed-refresh-token".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_profile_hides_secrets() {
        let profile = UserProfile::from(sample_user());
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"firstName\":\"Test\""));
        assert!(!json.contains("mock-hashed-password"));
        assert!(!json.contains("mock-hashed-refresh-token"));
    }

    #[test]
    fn test_token_pair_wire_format() {
        let pair = TokenPair {
            access_token: "access-token-mock".to_string(),
            refresh_token: "refresh-token-mock".to_string(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["accessToken"], "access-token-mock");
        assert_eq!(json["refreshToken"], "refresh-token-mock");
    }

    #[test]
    fn test_register_request_last_name_optional() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"firstName":"Test","email":"test@test.com","password":"StrongPass123!"}"#,
        )
        .unwrap();
        assert!(request.last_name.is_none());
    }

    #[test]
    fn test_update_request_null_last_name_is_a_clear() {
        let absent: UpdateUserRequest = serde_json::from_str(r#"{"firstName":"A"}"#).unwrap();
        assert_eq!(absent.last_name, None);

        let cleared: UpdateUserRequest = serde_json::from_str(r#"{"lastName":null}"#).unwrap();
        assert_eq!(cleared.last_name, Some(None));

        let set: UpdateUserRequest = serde_json::from_str(r#"{"lastName":"B"}"#).unwrap();
        assert_eq!(set.last_name, Some(Some("B".to_string())));
    }

    #[test]
    fn test_claim_payload_carries_user_id() {
        let user = sample_user();
        let payload = user.claim_payload();
        assert_eq!(payload.sub, user.id);
        assert_eq!(payload.email, user.email);
    }
}
