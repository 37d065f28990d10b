//! Postgres pool construction and schema migrations.

use anyhow::{Context, Result};
use clipdock_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Open the connection pool and bring the schema up to date.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!("connecting to Postgres");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "database pool ready"
    );

    // Migrations live at the workspace root, two directories above this crate.
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("read migrations directory")?;
    migrator
        .run(&pool)
        .await
        .context("apply database migrations")?;
    tracing::info!("migrations applied");

    Ok(pool)
}
