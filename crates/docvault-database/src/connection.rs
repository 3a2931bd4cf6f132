//! SQLite connection pool management.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use docvault_core::config::DatabaseConfig;
use docvault_core::error::{AppError, ErrorKind};

/// How long a writer waits on a locked catalog before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around the sqlx SQLite connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    /// The underlying sqlx connection pool.
    pool: SqlitePool,
}

impl DatabasePool {
    /// Create a new database pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %config.url,
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Opening SQLite catalog"
        );

        let options = SqliteConnectOptions::from_str(&config.url).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid catalog URL '{}': {e}", config.url),
                e,
            )
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(tune(options))
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to open catalog: {e}"),
                    e,
                )
            })?;

        info!("Catalog opened");
        Ok(Self { pool })
    }

    /// Open (creating if needed) a catalog file with default pool settings.
    pub async fn connect_file(path: &Path) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::new().filename(path);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(tune(options))
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to open catalog at {}: {e}", path.display()),
                    e,
                )
            })?;
        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Return the underlying sqlx pool (consuming self).
    pub fn into_pool(self) -> SqlitePool {
        self.pool
    }

    /// Check catalog connectivity.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Catalog pool closed");
    }
}

fn tune(options: SqliteConnectOptions) -> SqliteConnectOptions {
    options
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_file_creates_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let db = DatabasePool::connect_file(&path).await.unwrap();
        assert!(db.health_check().await.unwrap());
        assert!(path.exists());
        db.close().await;
    }
}
