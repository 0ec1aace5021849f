//! Expense Approval API Server
//!
//! # Usage
//!
//! ```bash
//! # In-memory store
//! cargo run --bin expense-api
//!
//! # PostgreSQL store
//! API_DATABASE_URL=postgres://... cargo run --bin expense-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string; unset uses memory
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_REPOSITORY_TIMEOUT_MS` - Per-call repository timeout (default: 5000)
//! * `API_READ_RETRIES` - Retries for failed repository reads (default: 2)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_expense::adapters::memory::{
    InMemoryClaimRepository, InMemoryDirectory, InMemoryPolicyRepository,
};
use domain_expense::ClaimWorkflow;
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, PostgresClaimAdapter, PostgresDirectoryAdapter,
    PostgresPolicyAdapter,
};
use interface_api::{config::ApiConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Expense Approval API Server"
    );

    let workflow = build_workflow(&config).await?;
    let app = create_router(Arc::new(workflow), config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid server address")?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wires the workflow to PostgreSQL when a database URL is configured,
/// otherwise to the in-memory adapters
async fn build_workflow(config: &ApiConfig) -> anyhow::Result<ClaimWorkflow> {
    let workflow = if config.uses_database() {
        let pool = create_pool(DatabaseConfig::new(&config.database_url))
            .await
            .context("database connection failed")?;
        run_migrations(&pool).await.context("database migration failed")?;

        ClaimWorkflow::new(
            Arc::new(PostgresClaimAdapter::new(pool.clone())),
            Arc::new(PostgresPolicyAdapter::new(pool.clone())),
            Arc::new(PostgresDirectoryAdapter::new(pool)),
        )
    } else {
        tracing::warn!("API_DATABASE_URL not set; using the in-memory store with an empty directory");
        ClaimWorkflow::new(
            Arc::new(InMemoryClaimRepository::new()),
            Arc::new(InMemoryPolicyRepository::new()),
            Arc::new(InMemoryDirectory::new()),
        )
    };

    Ok(workflow.with_config(config.workflow_config()))
}

/// Initializes the tracing subscriber for structured logging
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
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
