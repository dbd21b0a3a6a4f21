//! # Muster Server
//!
//! Main binary: runs the REST API and the three background reconciliation
//! loops (game lifecycle, channel lifecycle, membership) in one process.

use muster_api::{build_router, AppState};
use muster_db::Database;
use muster_engine::{channel::controller::ChannelWindows, scheduler::Scheduler};
use muster_platform::{rest::RestPlatform, ChatPlatform};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = muster_common::config::init()?;

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muster=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .init();

    tracing::info!("Starting Muster v{}", env!("CARGO_PKG_VERSION"));

    // Connect to Postgres and run migrations
    let db = Database::connect(&config.database).await?;
    db.migrate().await?;

    // Chat platform REST client
    let platform: Arc<dyn ChatPlatform> = Arc::new(RestPlatform::new(
        config.platform.bot_token.clone(),
        &config.platform.api_base,
        config.platform.guild_id.clone(),
        config.platform.category_id.clone(),
    )?);

    // Background reconciliation loops. Stateless across restarts; every
    // tick rebuilds its view from Postgres.
    let scheduler = Scheduler::new(
        db.clone(),
        platform.clone(),
        ChannelWindows::from(&config.channels),
        config.scheduler.clone(),
        &config.platform,
    );
    scheduler.spawn();

    // REST API
    let state = AppState {
        db,
        platform,
    };
    let router = build_router(state);
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
        return;
    }
    tracing::info!("Shutting down");
}
