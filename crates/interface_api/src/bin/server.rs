//! Commission engine API server
//!
//! # Usage
//!
//! ```bash
//! # In-memory stores, relaxed consistency
//! cargo run --bin commission-api
//!
//! # PostgreSQL with per-agent advisory locks
//! COMMISSION_STORAGE=postgres \
//! COMMISSION_DATABASE_URL=postgres://localhost/commissions \
//! COMMISSION_CONSISTENCY_MODE=strict \
//! cargo run --bin commission-api
//! ```
//!
//! # Environment Variables
//!
//! * `COMMISSION_HOST` / `COMMISSION_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `COMMISSION_JWT_SECRET` - JWT signing secret (required in production)
//! * `COMMISSION_JWT_EXPIRATION_SECS` - Token validity (default: 3600)
//! * `COMMISSION_STORAGE` - `memory` or `postgres` (default: memory)
//! * `COMMISSION_DATABASE_URL` - PostgreSQL connection string
//! * `COMMISSION_DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `COMMISSION_DATABASE_LOCK_CONNECTIONS` - Strict-mode lock pool size (default: 4)
//! * `COMMISSION_CONSISTENCY_MODE` - `relaxed` or `strict` (default: relaxed)
//! * `COMMISSION_CURRENCY` - Booking currency (default: USD)
//! * `COMMISSION_NOTIFICATION_MAX_RETRIES` / `COMMISSION_NOTIFICATION_BASE_DELAY_MS`
//! * `COMMISSION_LOG_LEVEL` - Used when `RUST_LOG` is unset (default: info)

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interface_api::config::{ApiConfig, StorageBackend};
use interface_api::{create_router, AppState, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid COMMISSION_* configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        "Starting commission engine API server"
    );

    let strict = config.consistency_mode.is_strict();
    let ports = match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; state is lost on restart");
            Ports::in_memory(strict)
        }
        StorageBackend::Postgres => {
            let pool = infra_db::connect_and_migrate(&config.database())
                .await
                .context("database setup failed")?;
            let lock_pool = if strict {
                let locks = infra_db::create_pool(&config.lock_database())
                    .await
                    .context("lock pool setup failed")?;
                Some(locks)
            } else {
                None
            };
            Ports::postgres(pool, lock_pool)
        }
    };

    let addr: SocketAddr = config.server_addr().parse()?;
    let state = AppState::new(config, ports)?;
    let app = create_router(state);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
