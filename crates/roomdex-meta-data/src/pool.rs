//! Connection pool construction

use roomdex_config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Create a `PostgreSQL` connection pool from configuration
///
/// # Errors
///
/// Returns an error if the initial connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.timeout_seconds))
        .connect(&config.url)
        .await
}
