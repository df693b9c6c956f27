//! Prometheus metrics.
//!
//! The exporter is only installed when a metrics address is configured;
//! until then every recording call is a no-op.
//!
//! | Metric | Kind | Labels |
//! |---|---|---|
//! | `http_requests_total` | counter | method, route, status |
//! | `http_request_duration_ms` | histogram | method, route |
//! | `auth_attempts_total` | counter | flow, success |
//!
//! ```rust,no_run
//! use gt_server::metrics::{self, AuthFlow};
//! use std::net::SocketAddr;
//!
//! # fn main() -> Result<(), String> {
//! let addr: SocketAddr = "127.0.0.1:9090".parse().map_err(|_| "bad address")?;
//! metrics::init_metrics(addr)?;
//! metrics::auth_attempt(AuthFlow::Login, true);
//! # Ok(())
//! # }
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, time::Duration};

/// Serve metrics at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Count a finished request and record its latency.
///
/// `route` must be the matched route template, not the raw path, so that
/// `/users/{id}` stays one series.
pub fn record_http_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

/// Credential-consuming flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Register,
    Login,
    Refresh,
}

impl AuthFlow {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthFlow::Register => "register",
            AuthFlow::Login => "login",
            AuthFlow::Refresh => "refresh",
        }
    }
}

pub fn auth_attempt(flow: AuthFlow, success: bool) {
    metrics::counter!("auth_attempts_total",
        "flow" => flow.as_str(),
        "success" => success.to_string()
    )
    .increment(1);
}
