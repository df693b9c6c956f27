//! Gym Tracker API server.
//!
//! Serves authentication and user profile endpoints backed by PostgreSQL,
//! or by an in-memory store when no database is configured.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use gt_server::{api, config::ServerConfig, logging, metrics};
use gym_tracker::{
    AuthManager, UserService,
    auth::{SecretHasher, TokenSigner},
    db::{Database, MemoryUserRepository, UserRepository},
};
use pico_args::Arguments;
use tracing::{info, warn};

const HELP: &str = "\
Run the Gym Tracker API server

USAGE:
  gt_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env APP_HOST:APP_PORT or 0.0.0.0:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL, in-memory store if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  ACCESS_TOKEN_SECRET      Access token signing secret (required, >= 32 chars)
  REFRESH_TOKEN_SECRET     Refresh token signing secret (required, >= 32 chars)
  ACCESS_TOKEN_EXPIRES     Access token lifetime, e.g. 15m  [default: 15m]
  REFRESH_TOKEN_EXPIRES    Refresh token lifetime, e.g. 7d  [default: 7d]
  APP_ALLOWED_ORIGINS      ';'-separated CORS origins  [default: any]
  METRICS_BIND             Prometheus listener address  [default: disabled]
  (See .env.example for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Prometheus metrics listening on {}", metrics_bind);
    }

    let database = match config.database {
        Some(ref db_config) => {
            info!("Connecting to database at {}", db_config.redacted_url());
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to run migrations")?;
            info!("Database connected and migrated");
            Some(db)
        }
        None => None,
    };

    let users: Arc<dyn UserRepository> = match database {
        Some(ref db) => Arc::new(db.user_repository()),
        None => {
            warn!("DATABASE_URL not set, using in-memory user store; data is lost on exit");
            Arc::new(MemoryUserRepository::new())
        }
    };

    let hasher = SecretHasher::new(config.hasher)?;
    let signer = TokenSigner::new(&config.security.token_config());

    let state = api::AppState {
        auth_manager: Arc::new(AuthManager::new(users.clone(), hasher.clone(), signer)),
        user_service: Arc::new(UserService::new(users, hasher)),
    };

    let app = api::create_router(state, &config.allowed_origins);

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
