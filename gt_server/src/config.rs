//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use axum::http::HeaderValue;
use chrono::Duration;
use gym_tracker::{
    auth::{HasherConfig, TokenConfig},
    db::DatabaseConfig,
};
use std::net::{IpAddr, SocketAddr};

/// Shortest accepted signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime, in days
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration; `None` runs on the in-memory user store
    pub database: Option<DatabaseConfig>,
    /// Token signing configuration
    pub security: SecurityConfig,
    /// Argon2 cost parameters
    pub hasher: HasherConfig,
    /// CORS origins; empty means any origin
    pub allowed_origins: Vec<HeaderValue>,
    /// Prometheus listener address
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Access token signing secret (required)
    pub access_token_secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token signing secret (required)
    pub refresh_token_secret: String,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
}

impl SecurityConfig {
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(&self.access_token_secret, &self.refresh_token_secret)
            .with_access_ttl(self.access_token_ttl)
            .with_refresh_ttl(self.refresh_token_ttl)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            database_url_override,
        )
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        // Bind address
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let host: IpAddr = env.parse_or("APP_HOST", IpAddr::from([0, 0, 0, 0]))?;
                let port: u16 = env.parse_or("APP_PORT", 3000)?;
                SocketAddr::new(host, port)
            }
        };

        // Database configuration
        let database = match database_url_override.or_else(|| env.get("DATABASE_URL")) {
            Some(database_url) => {
                let defaults = DatabaseConfig::development();
                Some(DatabaseConfig {
                    database_url,
                    max_connections: env.parse_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
                    min_connections: env.parse_or("DB_MIN_CONNECTIONS", defaults.min_connections)?,
                    connection_timeout_secs: env
                        .parse_or("DB_CONNECTION_TIMEOUT_SECS", defaults.connection_timeout_secs)?,
                    idle_timeout_secs: env
                        .parse_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs)?,
                    max_lifetime_secs: env
                        .parse_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs)?,
                })
            }
            None => None,
        };

        // Security configuration (REQUIRED)
        let security = SecurityConfig {
            access_token_secret: env.required("ACCESS_TOKEN_SECRET")?,
            access_token_ttl: env.duration_or("ACCESS_TOKEN_EXPIRES", Duration::minutes(15))?,
            refresh_token_secret: env.required("REFRESH_TOKEN_SECRET")?,
            refresh_token_ttl: env.duration_or("REFRESH_TOKEN_EXPIRES", Duration::days(7))?,
        };

        let hasher_defaults = HasherConfig::default();
        let hasher = HasherConfig {
            memory_kib: env.parse_or("ARGON2_MEMORY_KIB", hasher_defaults.memory_kib)?,
            iterations: env.parse_or("ARGON2_ITERATIONS", hasher_defaults.iterations)?,
            parallelism: env.parse_or("ARGON2_PARALLELISM", hasher_defaults.parallelism)?,
            max_concurrent: env
                .parse_or("ARGON2_MAX_CONCURRENT", hasher_defaults.max_concurrent)?,
        };

        let allowed_origins = match env.get("APP_ALLOWED_ORIGINS") {
            Some(origins) => parse_origins(&origins)?,
            None => Vec::new(),
        };

        let metrics_bind = match env.get("METRICS_BIND") {
            Some(addr) => Some(addr.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{addr}' is not a socket address"),
            })?),
            None => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            security,
            hasher,
            allowed_origins,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (var, secret) in [
            ("ACCESS_TOKEN_SECRET", &self.security.access_token_secret),
            ("REFRESH_TOKEN_SECRET", &self.security.refresh_token_secret),
        ] {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("Must be at least {MIN_SECRET_LEN} characters"),
                });
            }
        }

        if self.security.access_token_secret == self.security.refresh_token_secret {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_SECRET".to_string(),
                reason: "Must differ from ACCESS_TOKEN_SECRET".to_string(),
            });
        }

        if self.security.access_token_ttl <= Duration::zero() {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_EXPIRES".to_string(),
                reason: "Must be positive".to_string(),
            });
        }

        let max_ttl = Duration::days(MAX_TOKEN_TTL_DAYS);
        for (var, ttl) in [
            ("ACCESS_TOKEN_EXPIRES", self.security.access_token_ttl),
            ("REFRESH_TOKEN_EXPIRES", self.security.refresh_token_ttl),
        ] {
            if ttl > max_ttl {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("Must not exceed {MAX_TOKEN_TTL_DAYS}d"),
                });
            }
        }

        if self.security.refresh_token_ttl <= self.security.access_token_ttl {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_EXPIRES".to_string(),
                reason: "Must be longer than ACCESS_TOKEN_EXPIRES".to_string(),
            });
        }

        if self.hasher.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                var: "ARGON2_MAX_CONCURRENT".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if let Some(ref database) = self.database {
            if database.min_connections > database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed DB_MAX_CONNECTIONS ({})",
                        database.max_connections
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty value of `key`
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingRequired {
            var: key.to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
    {
        match self.get(key) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' could not be parsed"),
            }),
            None => Ok(default),
        }
    }

    fn duration_or(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        match self.get(key) {
            Some(value) => parse_duration(&value).ok_or_else(|| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("'{value}' is not a duration like 900, 30s, 15m, 12h or 7d"),
            }),
            None => Ok(default),
        }
    }
}

/// Parse a duration written as plain seconds or with an `s`/`m`/`h`/`d` suffix
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);
    let amount: i64 = amount.parse().ok()?;

    match unit.trim() {
        "" | "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    }
}

/// Parse `;`-separated CORS origins
fn parse_origins(value: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                var: "APP_ALLOWED_ORIGINS".to_string(),
                reason: format!("'{origin}' is not a valid origin"),
            })
        })
        .collect()
}
