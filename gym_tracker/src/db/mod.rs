//! Persistence for user records.
//!
//! [`UserRepository`] is the seam the authentication core depends on.
//! [`Database`] owns the sqlx pool behind [`PgUserRepository`];
//! [`MemoryUserRepository`] needs no database at all.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod repository;

pub use config::DatabaseConfig;
pub use repository::{MemoryUserRepository, PgUserRepository, UserRepository};

/// PostgreSQL pool plus schema migrations
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool sized by `config`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gym_tracker::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::with_url("postgres://postgres@localhost/gym_tracker");
    ///     let db = Database::new(&config).await?;
    ///     db.migrate().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// User store backed by this pool
    pub fn user_repository(&self) -> PgUserRepository {
        PgUserRepository::new(self.pool.clone())
    }

    /// Wait for checked-out connections and close the pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
