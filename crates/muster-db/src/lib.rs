//! # muster-db
//!
//! PostgreSQL persistence layer for Muster. One repository module per
//! entity; plain async functions over a `PgPool`. The atomic
//! check-and-insert for roster capacity and the per-game waitlist sequence
//! both live here, next to the tables they protect.

pub mod postgres;
pub mod repository;

use anyhow::Result;
use sqlx::PgPool;

/// Shared database handle passed through Axum state and the scheduler.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL.
    pub async fn connect(config: &muster_common::config::DatabaseConfig) -> Result<Self> {
        tracing::info!("Connecting to PostgreSQL...");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }
}
