//! HTTP API for the Gym Tracker server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework
//! - **Tower**: Middleware for CORS, request IDs, authentication
//! - **JWT**: Access tokens for normal routes, refresh tokens for rotation only
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health               - Health check (public)
//! POST   /auth/register        - Register user (public)
//! POST   /auth/login           - Login (public)
//! GET    /auth/logout          - Logout (access token)
//! GET    /auth/refresh-tokens  - Rotate tokens (refresh token)
//! GET    /users/me             - Own profile (access token)
//! PATCH  /users/me             - Update own profile (access token)
//! DELETE /users/me             - Delete own account (access token)
//! GET    /users/{id}           - Any profile (ADMIN)
//! GET    /users                - All profiles (ADMIN)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use gt_server::api::{create_router, AppState};
//! use gym_tracker::{AuthManager, UserService};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let auth_manager: AuthManager = unimplemented!();
//! # let user_service: UserService = unimplemented!();
//!
//! let state = AppState {
//!     auth_manager: Arc::new(auth_manager),
//!     user_service: Arc::new(user_service),
//! };
//!
//! let app = create_router(state, &[]);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use gym_tracker::{AuthManager, UserService};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use error::ApiError;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; both services sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub user_service: Arc<UserService>,
}

/// JSON request body whose rejection renders as an [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Create the complete API router with all endpoints and middleware.
///
/// An empty `allowed_origins` allows any origin.
pub fn create_router(state: AppState, allowed_origins: &[HeaderValue]) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let refresh_routes = Router::new()
        .route("/auth/refresh-tokens", get(auth::refresh_tokens))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_refresh_token,
        ));

    let admin_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route_layer(axum::middleware::from_fn(middleware::require_admin));

    let protected_routes = Router::new()
        .route("/auth/logout", get(auth::logout))
        .route(
            "/users/me",
            get(users::get_me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
        .merge(admin_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_access_token,
        ));

    Router::new()
        .merge(public_routes)
        .merge(refresh_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(allowed_origins.to_vec())
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the user store answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"1.0.0","database":true,"timestamp":"2025-11-22T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = state.auth_manager.users().health_check().await.is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
