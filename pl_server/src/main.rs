//! Pool league tournament server.
//!
//! Serves the scheduling API over HTTP, backed by PostgreSQL or, for local
//! runs and demos, by process memory.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use pl_server::{
    api,
    config::{ServerConfig, StorageBackend},
    logging, metrics,
};
use pool_league::{
    db::{Database, MemoryRepository},
    tournament::TournamentManager,
};
use tracing::{info, warn};

const HELP: &str = "\
Run the pool league tournament server

USAGE:
  pl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/league_db]

FLAGS:
  --memory                 Keep tournaments in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                 PostgreSQL connection string
  STORAGE_BACKEND              postgres | memory
  METRICS_BIND                 Prometheus exporter address (disabled if unset)
  DEFAULT_RACE_TO              Race-to for new tournaments [default: 5]
  DEFAULT_ROUND_ROBIN_CYCLES   Round-robin cycles for new tournaments [default: 1]
  RUST_LOG                     Log filter [default: info,sqlx=warn,hyper=warn]
";

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

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let storage_override = pargs.contains("--memory").then_some(StorageBackend::Memory);

    logging::init();

    let config = ServerConfig::from_env(bind_override, database_url_override, storage_override)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let manager = match config.storage {
        StorageBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::connect(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to apply migrations: {}", e))?;
            info!("Database connected and migrated");
            TournamentManager::with_repository(Arc::new(db.repository()))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, tournaments are lost on shutdown");
            TournamentManager::with_repository(Arc::new(MemoryRepository::new()))
        }
    };

    let api_state = api::AppState {
        manager: Arc::new(manager),
        defaults: config.defaults,
    };
    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
