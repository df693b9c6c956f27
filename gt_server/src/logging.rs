//! Structured logging setup and security audit events.
//!
//! The core crate logs through the `log` facade; `tracing-subscriber`'s
//! default features bridge those records into the same output.

use std::fmt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Install the global subscriber.
///
/// ```no_run
/// gt_server::logging::init();
/// tracing::info!("Server starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!(filter = DEFAULT_FILTER, "Logging initialized");
}

/// Authentication events worth auditing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// Unknown email or wrong password
    FailedLogin,
    /// Refresh token that is not the active one
    RefreshRejected,
    /// Valid token, insufficient role
    Forbidden,
}

impl SecurityEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityEvent::FailedLogin => "failed_login",
            SecurityEvent::RefreshRejected => "refresh_rejected",
            SecurityEvent::Forbidden => "forbidden",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit an audit line at `warn`. Callers must never pass secrets or tokens.
///
/// ```
/// use gt_server::logging::{SecurityEvent, log_security_event};
///
/// log_security_event(SecurityEvent::FailedLogin, "a@b.com", Some("req-123"), "Invalid credentials");
/// ```
pub fn log_security_event(
    event: SecurityEvent,
    email: &str,
    request_id: Option<&str>,
    detail: &str,
) {
    tracing::warn!(
        event = event.as_str(),
        email,
        request_id,
        "SECURITY: {}",
        detail
    );
}

/// One line per finished request; server errors are logged at `error`
pub fn log_api_request(
    request_id: &str,
    method: &str,
    route: &str,
    status: u16,
    duration_ms: u64,
) {
    if status >= 500 {
        tracing::error!(request_id, method, route, status, duration_ms, "Request failed");
    } else {
        tracing::info!(request_id, method, route, status, duration_ms, "Request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_event_names() {
        assert_eq!(SecurityEvent::FailedLogin.to_string(), "failed_login");
        assert_eq!(SecurityEvent::RefreshRejected.as_str(), "refresh_rejected");
        assert_eq!(SecurityEvent::Forbidden.as_str(), "forbidden");
    }

    #[test]
    fn test_logging_without_subscriber() {
        log_security_event(SecurityEvent::Forbidden, "a@b.com", None, "role USER");
        log_api_request("req-1", "GET", "/users/me", 200, 45);
        log_api_request("req-2", "POST", "/auth/login", 500, 120);
    }
}
