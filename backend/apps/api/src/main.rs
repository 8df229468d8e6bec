//! API Server Entry Point
//!
//! Loads configuration, initialises tracing, selects the storage driver,
//! seeds the first administrator and serves the composed router until
//! Ctrl-C or SIGTERM. Uses `anyhow` for startup errors; request-level
//! errors are `kernel::AppError`.

mod app;
mod config;

use std::net::SocketAddr;

use auth::{AccountRepository, AuthAppState, MemoryAccountRepository, PgAccountRepository};
use platform::env::Env;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker::{MemoryTrackerStore, PgTrackerStore, TrackerAppState, TrackerStore};

use crate::config::{Config, LogFormat, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env(&Env::from_process())?;
    init_tracing(&config);

    match config.store.clone() {
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(&url)
                .await?;
            tracing::info!(max_connections, "Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;
            tracing::info!("Migrations completed");

            serve(
                config,
                PgAccountRepository::new(pool.clone()),
                PgTrackerStore::new(pool),
            )
            .await
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on shutdown");
            let store = MemoryTrackerStore::new();
            let accounts = MemoryAccountRepository::linked(store.clone());
            serve(config, accounts, store).await
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

async fn serve<R, S>(config: Config, accounts: R, store: S) -> anyhow::Result<()>
where
    R: AccountRepository + Send + Sync + 'static,
    S: TrackerStore,
{
    let ownership = config.auth.ownership;
    let auth = AuthAppState::new(accounts, config.auth)?;
    if let Some(seed) = config.admin {
        auth.accounts().ensure_admin(seed).await?;
    }
    let tracker = TrackerAppState::new(store, ownership);

    let app = app::with_middleware(
        app::build_app(auth, tracker),
        &config.cors_origins,
        config.request_timeout,
    );

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
