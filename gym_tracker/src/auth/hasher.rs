//! Argon2id hashing for passwords and refresh tokens.

use super::errors::{AuthError, AuthResult};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Secret verified when the caller has no stored hash to check against.
const DUMMY_SECRET: &str = "gym-tracker-dummy-password";

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
    /// Hashes allowed to run at once; each holds `memory_kib` while running
    pub max_concurrent: usize,
}

impl HasherConfig {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
            max_concurrent: default_max_concurrent(),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }
}

/// One running hash per available CPU
fn default_max_concurrent() -> usize {
    std::thread::available_parallelism().map_or(4, NonZeroUsize::get)
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// One-way hasher producing self-describing PHC strings.
///
/// Hashing is CPU and memory heavy, so every call runs on the blocking pool
/// and at most `max_concurrent` calls run at once across all clones.
#[derive(Clone)]
pub struct SecretHasher {
    params: Params,
    dummy_hash: Arc<str>,
    permits: Arc<Semaphore>,
}

impl SecretHasher {
    /// Create a hasher and precompute the dummy hash used by
    /// [`SecretHasher::verify_or_dummy`].
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - Parameters rejected by argon2, or a
    ///   `max_concurrent` of zero
    pub fn new(config: HasherConfig) -> AuthResult<Self> {
        if config.max_concurrent == 0 {
            return Err(AuthError::HashingFailed(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AuthError::HashingFailed(e.to_string()))?;

        let dummy_hash = hash_blocking(&params, DUMMY_SECRET)?;

        Ok(Self {
            params,
            dummy_hash: dummy_hash.into(),
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Run `work` on the blocking pool once a permit is free.
    ///
    /// The permit moves into the task, so it is held until the hash finishes
    /// even if the caller stops waiting.
    async fn run_limited<T, F>(&self, work: F) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?;

        Ok(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await?)
    }

    /// Hash a secret with a fresh random salt
    pub async fn hash(&self, secret: &str) -> AuthResult<String> {
        let params = self.params.clone();
        let secret = secret.to_owned();
        self.run_limited(move || hash_blocking(&params, &secret)).await?
    }

    /// Check a candidate against a stored hash.
    ///
    /// A stored value that is not a valid PHC string never matches.
    pub async fn verify(&self, hashed: &str, candidate: &str) -> AuthResult<bool> {
        let hashed = hashed.to_owned();
        let candidate = candidate.to_owned();
        self.run_limited(move || verify_blocking(&hashed, &candidate))
            .await
    }

    /// Verify against `hashed`, or against the dummy hash when there is none.
    ///
    /// Both branches run one full Argon2 computation so an absent record costs
    /// the same time as a wrong secret. The absent branch always yields `false`.
    pub async fn verify_or_dummy(&self, hashed: Option<&str>, candidate: &str) -> AuthResult<bool> {
        match hashed {
            Some(hashed) => self.verify(hashed, candidate).await,
            None => {
                let dummy = self.dummy_hash.clone();
                self.verify(&dummy, candidate).await?;
                Ok(false)
            }
        }
    }
}

fn hash_blocking(params: &Params, secret: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    Ok(argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthError::HashingFailed(e.to_string()))?
        .to_string())
}

fn verify_blocking(hashed: &str, candidate: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hashed) else {
        return false;
    };

    // Cost parameters come from the PHC string itself.
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> SecretHasher {
        SecretHasher::new(HasherConfig::new(1024, 1, 1)).unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("Str0ng!Pass").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&hash, "Str0ng!Pass").await.unwrap());
        assert!(!hasher.verify(&hash, "Str0ng!Pas").await.unwrap());
    }

    #[tokio::test]
    async fn test_salt_is_random() {
        let hasher = fast_hasher();
        let first = hasher.hash("same-secret").await.unwrap();
        let second = hasher.hash("same-secret").await.unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify(&first, "same-secret").await.unwrap());
        assert!(hasher.verify(&second, "same-secret").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_never_matches() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("not-a-phc-string", "anything").await.unwrap());
        assert!(!hasher.verify("", "").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_or_dummy_absent_is_false() {
        let hasher = fast_hasher();
        assert!(!hasher.verify_or_dummy(None, DUMMY_SECRET).await.unwrap());
        assert!(!hasher.verify_or_dummy(None, "whatever").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_or_dummy_present() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret").await.unwrap();
        assert!(hasher.verify_or_dummy(Some(&hash), "secret").await.unwrap());
        assert!(!hasher.verify_or_dummy(Some(&hash), "other").await.unwrap());
    }

    #[test]
    fn test_invalid_params_rejected() {
        // Memory below 8 KiB per lane is refused by argon2
        let result = SecretHasher::new(HasherConfig::new(1, 1, 1));
        assert!(matches!(result, Err(AuthError::HashingFailed(_))));
    }

    #[test]
    fn test_default_config_matches_argon2_defaults() {
        let config = HasherConfig::default();
        assert_eq!(config.memory_kib, 19 * 1024);
        assert_eq!(config.iterations, 2);
        assert_eq!(config.parallelism, 1);
        assert!(config.max_concurrent >= 1);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = SecretHasher::new(HasherConfig::new(1024, 1, 1).with_max_concurrent(0));
        assert!(matches!(result, Err(AuthError::HashingFailed(_))));
    }

    #[tokio::test]
    async fn test_hash_waits_for_a_free_permit() {
        let hasher = SecretHasher::new(HasherConfig::new(1024, 1, 1).with_max_concurrent(2))
            .unwrap();

        // A clone shares the same permits
        let held = hasher.clone().permits.acquire_many_owned(2).await.unwrap();

        let waiting = tokio::spawn({
            let hasher = hasher.clone();
            async move { hasher.hash("queued").await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!waiting.is_finished());

        drop(held);
        let hash = waiting.await.unwrap().unwrap();
        assert!(hasher.verify(&hash, "queued").await.unwrap());
        assert_eq!(hasher.permits.available_permits(), 2);
    }
}
