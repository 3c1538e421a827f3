//! Database connection and entity persistence helpers

pub mod schema_sync;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult};

use crate::config::Config;
use crate::orm::{DatabaseEntity, DatabaseSchema, SqlValue};

pub use schema_sync::{SchemaSyncResult, sync_entity};

/// Database wrapper providing connection pool access
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    fn pool_options(config: &Config) -> Result<(SqlitePoolOptions, SqliteConnectOptions)> {
        let connect = SqliteConnectOptions::from_str(&config.database_url)
            .with_context(|| format!("Invalid DATABASE_URL '{}'", config.database_url))?
            .create_if_missing(true);
        let mut pool = SqlitePoolOptions::new()
            .max_connections(config.effective_max_connections())
            .acquire_timeout(Duration::from_secs(10));
        if config.is_in_memory() {
            // Closing the only connection drops the database
            pool = pool.idle_timeout(None).max_lifetime(None);
        }
        Ok((pool, connect))
    }

    /// Create a new database connection pool
    pub async fn connect(config: &Config) -> Result<Self> {
        let (pool, connect) = Self::pool_options(config)?;
        let pool = pool
            .connect_with(connect)
            .await
            .with_context(|| format!("Failed to connect to '{}'", config.database_url))?;

        tracing::debug!(url = %config.database_url, "Database connected");
        Ok(Self { pool })
    }

    /// Create a new database connection pool, retrying until
    /// `config.connect_timeout` has elapsed
    pub async fn connect_with_retry(config: &Config, retry_interval: Duration) -> Result<Self> {
        let deadline = tokio::time::Instant::now() + config.connect_timeout;
        loop {
            match Self::connect(config).await {
                Ok(db) => return Ok(db),
                Err(e) if tokio::time::Instant::now() + retry_interval < deadline => {
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = retry_interval.as_millis() as u64,
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(retry_interval).await;
                }
                Err(e) => return Err(e).context("Database connection retries exhausted"),
            }
        }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create or extend the entity's table
    pub async fn sync<E: DatabaseSchema>(&self) -> Result<SchemaSyncResult, sqlx::Error> {
        sync_entity::<E>(&self.pool).await
    }

    /// Insert one entity row, binding every column
    pub async fn insert<E: DatabaseEntity>(
        &self,
        entity: &E,
    ) -> Result<SqliteQueryResult, sqlx::Error> {
        let columns = E::column_names();
        let values: Vec<SqlValue> = columns
            .iter()
            .map(|c| entity.column_value(c).unwrap_or(SqlValue::Null))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE_NAME,
            columns.join(", "),
            placeholders.join(", ")
        );

        execute_with_binds(&sql, &values, &self.pool).await
    }
}

/// Execute an INSERT/UPDATE query with bound values.
pub async fn execute_with_binds(
    sql: &str,
    values: &[SqlValue],
    pool: &SqlitePool,
) -> Result<SqliteQueryResult, sqlx::Error> {
    tracing::debug!(sql = %sql, binds = values.len(), "Executing statement");
    let mut query = sqlx::query(sql);
    for value in values {
        query = value.bind_to(query);
    }
    query.execute(pool).await
}
