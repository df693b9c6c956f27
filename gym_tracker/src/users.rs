//! Profile operations on registered users.

use crate::auth::{
    AuthError, AuthResult, ProfileUpdate, SecretHasher, UpdateUserRequest, UserId, UserProfile,
    validation,
};
use crate::db::UserRepository;
use std::sync::Arc;

/// User profile service
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: SecretHasher,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: SecretHasher) -> Self {
        Self { users, hasher }
    }

    /// Profile of the user with the given id
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No such user
    pub async fn get_by_id(&self, user_id: UserId) -> AuthResult<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// All profiles, oldest first
    pub async fn list(&self) -> AuthResult<Vec<UserProfile>> {
        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .map(UserProfile::from)
            .collect())
    }

    /// Update a profile. A new password is hashed before it reaches the store.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - A present field failed validation
    /// * `AuthError::UserNotFound` - No such user
    pub async fn update(&self, user_id: UserId, request: UpdateUserRequest) -> AuthResult<UserProfile> {
        validation::validate_update(&request)?;

        let hashed_password = match request.password {
            Some(ref password) => Some(self.hasher.hash(password).await?),
            None => None,
        };

        let update = ProfileUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
            hashed_password,
        };

        self.users
            .update_profile(user_id, update)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete an account
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No such user
    pub async fn delete(&self, user_id: UserId) -> AuthResult<()> {
        if self.users.delete_by_id(user_id).await? {
            log::info!("Deleted user {}", user_id);
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{HasherConfig, NewUser, Role};
    use crate::db::MemoryUserRepository;
    use uuid::Uuid;

    async fn setup() -> (UserService, Arc<MemoryUserRepository>, UserId) {
        let repo = Arc::new(MemoryUserRepository::new());
        let hasher = SecretHasher::new(HasherConfig::new(1024, 1, 1)).unwrap();
        let user = repo
            .create(NewUser {
                first_name: "Test".to_string(),
                last_name: Some("Test".to_string()),
                email: "test@test.com".to_string(),
                role: Role::User,
                hashed_password: hasher.hash("StrongPass123!").await.unwrap(),
            })
            .await
            .unwrap();
        (UserService::new(repo.clone(), hasher), repo, user.id)
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (service, _, id) = setup().await;

        let me = service.get_by_id(id).await.unwrap();
        assert_eq!(me.first_name, "Test");
        assert_eq!(me.email, "test@test.com");
        assert_eq!(service.list().await.unwrap(), vec![me]);

        assert!(matches!(
            service.get_by_id(Uuid::new_v4()).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_rehashes_password() {
        let (service, repo, id) = setup().await;

        let profile = service
            .update(
                id,
                UpdateUserRequest {
                    first_name: Some("Renamed".to_string()),
                    password: Some("N3w!Password".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.first_name, "Renamed");

        let stored = repo.find_by_email("test@test.com").await.unwrap().unwrap();
        assert!(service.hasher.verify(&stored.hashed_password, "N3w!Password").await.unwrap());
        assert!(!service.hasher.verify(&stored.hashed_password, "StrongPass123!").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_clears_last_name() {
        let (service, _, id) = setup().await;

        let untouched = service
            .update(id, UpdateUserRequest::default())
            .await
            .unwrap();
        assert_eq!(untouched.last_name.as_deref(), Some("Test"));

        let cleared = service
            .update(
                id,
                UpdateUserRequest {
                    last_name: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.last_name.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (service, _, _) = setup().await;
        let result = service
            .update(Uuid::new_v4(), UpdateUserRequest::default())
            .await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_delete() {
        let (service, _, id) = setup().await;

        service.delete(id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
        assert!(matches!(
            service.delete(id).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
