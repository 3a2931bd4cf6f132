//! DocVault server: keeps the catalog reconciled with the document tree.
//!
//! Main entry point that wires the crates together and runs the periodic
//! scan until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_database::DatabasePool;
use docvault_database::migration::run_migrations;
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_service::DocumentService;
use docvault_storage::LocalStorageProvider;
use docvault_worker::{ScanScheduler, ScanSchedulerConfig};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `DOCVAULT_CONFIG` or the environment overlays.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("DOCVAULT_CONFIG") {
        Ok(path) => AppConfig::load_from(&PathBuf::from(path)),
        Err(_) => {
            let env = std::env::var("DOCVAULT_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DocVault v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Document tree ────────────────────────────────────
    let storage = Arc::new(LocalStorageProvider::new(&config.storage.root_path).await?);
    tracing::info!(root = %storage.root().display(), "Document tree ready");

    // ── Step 2: Catalog connection + migrations ──────────────────
    let pool = DatabasePool::connect(&config.database).await?;
    run_migrations(pool.pool()).await?;

    let documents = Arc::new(DocumentRepository::new(pool.pool().clone()));
    let history = Arc::new(HistoryRepository::new(pool.pool().clone()));
    let service = Arc::new(DocumentService::new(documents, history, storage, &config)?);

    // ── Step 3: Initial reconciliation ───────────────────────────
    match service.scan("", None).await {
        Ok(report) => tracing::info!(
            inserted = report.inserted,
            updated = report.updated,
            marked_missing = report.marked_missing,
            errors = report.errors,
            "Startup scan complete"
        ),
        Err(e) => tracing::warn!(error = %e, "Startup scan failed"),
    }

    // ── Step 4: Periodic scan ────────────────────────────────────
    let mut scheduler = ScanScheduler::new(ScanSchedulerConfig::from(&config.scanner), service);
    scheduler.start().await?;

    // ── Step 5: Graceful shutdown ────────────────────────────────
    shutdown_signal().await?;
    tracing::info!("Shutdown signal received, stopping scheduler...");

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
    }
    pool.close().await;

    tracing::info!("DocVault shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() -> Result<(), AppError> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| AppError::internal(format!("Failed to install Ctrl+C handler: {e}")))
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .map_err(|e| AppError::internal(format!("Failed to install SIGTERM handler: {e}")))?;
        signal.recv().await;
        Ok::<(), AppError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), AppError>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}
