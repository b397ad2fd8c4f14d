//! PostgreSQL pool bootstrap.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::PostgresConfig;

/// Connect with bounded retries, then apply pending migrations.
///
/// Running out of attempts is fatal: the caller never gets a pool that has
/// not answered at least once.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool> {
    let attempts = config.conn_attempts.max(1);
    let mut attempts_left = attempts;

    let pool = loop {
        attempts_left -= 1;
        let result = PgPoolOptions::new()
            .max_connections(config.max_pool_size)
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => break pool,
            Err(e) if attempts_left > 0 => {
                warn!(
                    error = %e,
                    attempts_left,
                    retry_in = ?config.conn_retry_timeout,
                    "database not ready, retrying"
                );
                tokio::time::sleep(config.conn_retry_timeout).await;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to connect to database after {} attempts", attempts)
                })
            }
        }
    };
    info!(max_connections = config.max_pool_size, "Database connected");

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations complete");
    Ok(())
}

