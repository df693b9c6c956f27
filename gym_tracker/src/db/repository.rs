//! Repository trait definitions for testability and dependency injection.
//!
//! The authentication core only talks to [`UserRepository`]. The PostgreSQL
//! implementation is used in production; [`MemoryUserRepository`] backs
//! tests and database-less local runs.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult, NewUser, ProfileUpdate, User, UserId};

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by email (exact, case-sensitive match)
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Create a new user
    ///
    /// Fails with `AuthError::EmailTaken` when the email is already stored.
    async fn create(&self, new_user: NewUser) -> AuthResult<User>;

    /// Replace the stored refresh token hash of a user
    ///
    /// Fails with `AuthError::UserNotFound` when the user no longer exists.
    async fn update_refresh_hash(&self, user_id: UserId, hash: &str) -> AuthResult<()>;

    /// Clear the refresh token hash if one is set
    async fn clear_refresh_hash(&self, email: &str) -> AuthResult<()>;

    /// List all users, oldest first
    async fn list(&self) -> AuthResult<Vec<User>>;

    /// Apply a partial profile update, returning the updated user if it exists
    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AuthResult<Option<User>>;

    /// Delete a user, returning whether a row was removed
    async fn delete_by_id(&self, user_id: UserId) -> AuthResult<bool>;

    /// Check that the backing store is reachable
    async fn health_check(&self) -> AuthResult<()>;
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, role, hashed_password, \
                            hashed_refresh_token, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        hashed_password: row.try_get("hashed_password")?,
        hashed_refresh_token: row.try_get("hashed_refresh_token")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Default PostgreSQL implementation of `UserRepository`
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn create(&self, new_user: NewUser) -> AuthResult<User> {
        let result = sqlx::query(&format!(
            "INSERT INTO users (id, first_name, last_name, email, role, hashed_password)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(new_user.role)
        .bind(&new_user.hashed_password)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)?),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_refresh_hash(&self, user_id: UserId, hash: &str) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE users SET hashed_refresh_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn clear_refresh_hash(&self, email: &str) -> AuthResult<()> {
        sqlx::query(
            "UPDATE users SET hashed_refresh_token = NULL, updated_at = NOW()
             WHERE email = $1 AND hashed_refresh_token IS NOT NULL",
        )
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect::<Result<_, _>>()?)
    }

    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AuthResult<Option<User>> {
        // $3 says whether last_name is written at all; $4 may be NULL to clear it
        let row = sqlx::query(&format!(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = CASE WHEN $3 THEN $4 ELSE last_name END,
                hashed_password = COALESCE($5, hashed_password),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&update.first_name)
        .bind(update.last_name.is_some())
        .bind(update.last_name.flatten())
        .bind(&update.hashed_password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn delete_by_id(&self, user_id: UserId) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> AuthResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-process implementation of `UserRepository`.
///
/// Each operation holds the lock for its whole duration, which gives the same
/// per-row atomicity as a single SQL statement.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a user, replacing any with the same id
    pub fn with_user(self, user: User) -> Self {
        self.lock().insert(user.id, user);
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self.lock().values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.lock().get(&user_id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> AuthResult<User> {
        let mut users = self.lock();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailTaken);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            role: new_user.role,
            hashed_password: new_user.hashed_password,
            hashed_refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_refresh_hash(&self, user_id: UserId, hash: &str) -> AuthResult<()> {
        let mut users = self.lock();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.hashed_refresh_token = Some(hash.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn clear_refresh_hash(&self, email: &str) -> AuthResult<()> {
        if let Some(user) = self
            .lock()
            .values_mut()
            .find(|u| u.email == email && u.hashed_refresh_token.is_some())
        {
            user.hashed_refresh_token = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self.lock().values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AuthResult<Option<User>> {
        let mut users = self.lock();
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(None);
        };

        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(hashed_password) = update.hashed_password {
            user.hashed_password = hashed_password;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_by_id(&self, user_id: UserId) -> AuthResult<bool> {
        Ok(self.lock().remove(&user_id).is_some())
    }

    async fn health_check(&self) -> AuthResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Test".to_string(),
            last_name: Some("Test".to_string()),
            email: email.to_string(),
            role: Role::User,
            hashed_password: "hash123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_create_and_find() {
        let repo = MemoryUserRepository::new();

        let user = repo.create(new_user("test@test.com")).await.unwrap();
        assert!(user.hashed_refresh_token.is_none(), "New users have no session");

        let by_email = repo.find_by_email("test@test.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "test@test.com");

        assert!(repo.find_by_email("other@test.com").await.unwrap().is_none());
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_email_is_case_sensitive() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("test@test.com")).await.unwrap();

        assert!(repo.find_by_email("TEST@test.com").await.unwrap().is_none());
        assert!(repo.create(new_user("TEST@test.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_duplicate_email() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("dup@test.com")).await.unwrap();

        let result = repo.create(new_user("dup@test.com")).await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_refresh_hash_lifecycle() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("session@test.com")).await.unwrap();

        repo.update_refresh_hash(user.id, "hash-1").await.unwrap();
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.hashed_refresh_token.as_deref(), Some("hash-1"));

        repo.update_refresh_hash(user.id, "hash-2").await.unwrap();
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.hashed_refresh_token.as_deref(), Some("hash-2"));

        repo.clear_refresh_hash("session@test.com").await.unwrap();
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.hashed_refresh_token.is_none());

        // Clearing again and clearing an unknown email are both no-ops
        repo.clear_refresh_hash("session@test.com").await.unwrap();
        repo.clear_refresh_hash("nobody@test.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_refresh_hash_for_deleted_user() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("deleted@test.com")).await.unwrap();
        assert!(repo.delete_by_id(user.id).await.unwrap());

        let result = repo.update_refresh_hash(user.id, "hash-1").await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
        assert!(repo.find_by_email("deleted@test.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_update_profile() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("profile@test.com")).await.unwrap();

        let updated = repo
            .update_profile(
                user.id,
                ProfileUpdate {
                    first_name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.first_name, "Renamed");
        assert_eq!(updated.last_name.as_deref(), Some("Test"));
        assert_eq!(updated.hashed_password, "hash123");

        let cleared = repo
            .update_profile(
                user.id,
                ProfileUpdate {
                    last_name: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.first_name, "Renamed");
        assert!(cleared.last_name.is_none());

        let missing = repo
            .update_profile(Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_memory_delete() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("gone@test.com")).await.unwrap();

        assert!(repo.delete_by_id(user.id).await.unwrap());
        assert!(!repo.delete_by_id(user.id).await.unwrap());
        assert!(repo.find_by_email("gone@test.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_with_user() {
        let now = Utc::now();
        let preloaded = User {
            id: Uuid::new_v4(),
            first_name: "Admin".to_string(),
            last_name: None,
            email: "admin@test.com".to_string(),
            role: Role::Admin,
            hashed_password: "hash".to_string(),
            hashed_refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        let repo = MemoryUserRepository::new().with_user(preloaded.clone());
        let found = repo.find_by_id(preloaded.id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
        assert!(repo.health_check().await.is_ok());
    }
}
