use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::DatabaseConfig;

/// Pool limits derived from configuration.
///
/// Connections open lazily up to `max_open_conns`. Idle ones are closed after
/// `max_idle_time`, but never below the `min_idle_conns` floor.
pub fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(config.min_idle_conns)
        .idle_timeout(config.max_idle_time)
}

/// Initialize and return a PostgreSQL connection pool.
///
/// The first connection is opened eagerly so an unreachable store fails
/// startup instead of the first request.
pub async fn init_db(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_open_conns,
        min_idle_connections = config.min_idle_conns,
        idle_timeout_secs = config.max_idle_time.as_secs(),
        "Connecting to database..."
    );

    let pool = pool_options(config).connect(&config.url).await?;

    info!("Database connection established");
    Ok(pool)
}
