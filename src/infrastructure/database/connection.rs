//! SQLite connection pool management.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;

/// Connection pool with WAL mode enabled for concurrent access.
pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Open a pool against the given SQLite URL
    /// (e.g. `sqlite:.mender/history.db` or `sqlite::memory:`).
    pub async fn new(database_url: &str, max_connections: u32) -> DomainResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .idle_timeout(Duration::from_secs(30))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Open the pool named by configuration, creating parent directories of
    /// the database file as needed.
    pub async fn from_config(config: &DatabaseConfig) -> DomainResult<Self> {
        if let Some(parent) = std::path::Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
            }
        }
        Self::new(&format!("sqlite:{}", config.path), config.max_connections).await
    }

    /// Apply pending migrations. Safe to call on every startup.
    pub async fn migrate(&self) -> DomainResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
