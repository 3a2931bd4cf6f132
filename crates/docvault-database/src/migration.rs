//! Catalog migration runner.

use sqlx::SqlitePool;
use tracing::info;

use docvault_core::error::{AppError, ErrorKind};

/// Run all pending catalog migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    info!("Running catalog migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Catalog migrations completed successfully");
    Ok(())
}
