//! Database adapters: SQLite connection pool and schema bootstrap.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Open a connection pool for the configured database, creating the file if missing.
///
/// In-memory URLs get a single, never-recycled connection: every SQLite
/// connection to `:memory:` would otherwise see its own empty database.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options.connect_with(options).await?;
    tracing::info!(
        url = %config.url,
        in_memory = config.is_in_memory(),
        "connected to product database"
    );
    Ok(pool)
}

/// Create the `product` table and its index if they do not exist yet.
///
/// `price` holds the canonical decimal string; timestamps are RFC 3339 UTC text
/// with fixed microsecond precision, so string order equals time order.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT    NOT NULL,
            price       TEXT    NOT NULL,
            available   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS product_available_idx
            ON product (available)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("product schema is up to date");
    Ok(())
}

/// Convenience for tests and local runs: a migrated, private in-memory database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await?;
    migrate(&pool).await?;
    Ok(pool)
}
