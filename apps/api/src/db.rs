use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::records::store::migrate;

/// Creates the SQLite connection pool and makes sure the schema exists.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to SQLite at {database_url}...");

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    // An in-memory database lives and dies with its connection.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if max_connections == 1 {
        pool_options = pool_options
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    let pool = pool_options.connect_with(options).await?;

    migrate(&pool)
        .await
        .context("Failed to create matches table")?;

    info!("SQLite connection pool established");
    Ok(pool)
}
