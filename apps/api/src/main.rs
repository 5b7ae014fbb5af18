mod config;
mod db;
mod errors;
mod mentorship;
mod models;
mod routes;
mod state;
mod users;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::mentorship::coordinator::ApprovalCoordinator;
use crate::mentorship::notifications::PgNotificationStore;
use crate::mentorship::requests::PgRequestLedger;
use crate::mentorship::sessions::PgSessionRegistry;
use crate::routes::build_router;
use crate::state::AppState;
use crate::users::PgUserDirectory;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aegis API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    // Wire the workflow stores and the coordinator over them
    let users = Arc::new(PgUserDirectory::new(pool.clone()));
    let ledger = Arc::new(PgRequestLedger::new(pool.clone()));
    let registry = Arc::new(PgSessionRegistry::new(pool.clone()));
    let notifier = Arc::new(PgNotificationStore::new(pool));

    let coordinator = ApprovalCoordinator::new(
        ledger.clone(),
        registry.clone(),
        notifier.clone(),
        users.clone(),
    );

    let state = AppState {
        users,
        ledger,
        registry,
        notifier,
        coordinator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
