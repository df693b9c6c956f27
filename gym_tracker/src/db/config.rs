//! Connection pool settings.

/// PostgreSQL pool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free connection
    pub connection_timeout_secs: u64,
    /// Seconds before an unused connection is closed
    pub idle_timeout_secs: u64,
    /// Seconds before any connection is recycled
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Default pool sizes for `database_url`
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::development()
        }
    }

    /// Local database with the default pool sizes
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/gym_tracker".to_string(),
            max_connections: 20,
            min_connections: 1,
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        }
    }

    /// Connection URL with any password masked, safe to log
    pub fn redacted_url(&self) -> String {
        let url = &self.database_url;
        let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
            return url.clone();
        };
        let authority_end = url[scheme_end..]
            .find('/')
            .map_or(url.len(), |i| scheme_end + i);

        match url[scheme_end..authority_end].rfind('@') {
            Some(at) => {
                let userinfo = &url[scheme_end..scheme_end + at];
                match userinfo.split_once(':') {
                    Some((user, _)) => format!(
                        "{}{}:***{}",
                        &url[..scheme_end],
                        user,
                        &url[scheme_end + at..]
                    ),
                    None => url.clone(),
                }
            }
            None => url.clone(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_url_keeps_pool_defaults() {
        let config = DatabaseConfig::with_url("postgres://db/app");
        assert_eq!(config.database_url, "postgres://db/app");
        assert_eq!(config.max_connections, DatabaseConfig::default().max_connections);
        assert_eq!(config.max_lifetime_secs, 1800);
    }

    #[test]
    fn test_redacted_url() {
        let redact = |url: &str| DatabaseConfig::with_url(url).redacted_url();

        assert_eq!(
            redact("postgres://gym:hunter2@db:5432/gym_tracker"),
            "postgres://gym:***@db:5432/gym_tracker"
        );
        assert_eq!(
            redact("postgres://postgres@localhost/gym_tracker"),
            "postgres://postgres@localhost/gym_tracker"
        );
        assert_eq!(redact("postgres://localhost/gym"), "postgres://localhost/gym");
        assert_eq!(redact("not a url"), "not a url");
    }
}
