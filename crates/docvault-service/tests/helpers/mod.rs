//! Shared fixture: a temp directory holding a document root and a catalog.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sqlx::SqlitePool;
use tempfile::TempDir;

use docvault_core::config::{
    AppConfig, CryptoConfig, DatabaseConfig, LoggingConfig, ScannerConfig, StorageConfig,
};
use docvault_core::traits::storage::StorageProvider;
use docvault_database::DatabasePool;
use docvault_database::migration::run_migrations;
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::DocumentEntity;
use docvault_service::DocumentService;
use docvault_storage::LocalStorageProvider;

pub struct TestVault {
    pub dir: TempDir,
    pub pool: SqlitePool,
    pub documents: Arc<DocumentRepository>,
    pub history: Arc<HistoryRepository>,
    pub service: DocumentService,
}

pub fn config(root: &Path, encrypt_uploads: bool) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
            max_connections: 4,
            min_connections: 1,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 60,
        },
        storage: StorageConfig {
            root_path: root.display().to_string(),
            max_upload_size_bytes: 1024 * 1024,
        },
        crypto: CryptoConfig {
            key: STANDARD.encode([7u8; 32]),
            encrypt_uploads,
        },
        scanner: ScannerConfig {
            yield_every: 4,
            ..ScannerConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

pub async fn vault() -> TestVault {
    vault_with(true).await
}

pub async fn vault_with(encrypt_uploads: bool) -> TestVault {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("documents");

    let db = DatabasePool::connect_file(&dir.path().join("catalog.db"))
        .await
        .unwrap();
    run_migrations(db.pool()).await.unwrap();
    let pool = db.pool().clone();

    let storage: Arc<dyn StorageProvider> =
        Arc::new(LocalStorageProvider::new(&root).await.unwrap());
    let documents = Arc::new(DocumentRepository::new(pool.clone()));
    let history = Arc::new(HistoryRepository::new(pool.clone()));
    let service = DocumentService::new(
        Arc::clone(&documents),
        Arc::clone(&history),
        storage,
        &config(&root, encrypt_uploads),
    )
    .unwrap();

    TestVault {
        dir,
        pool,
        documents,
        history,
        service,
    }
}

impl TestVault {
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("documents")
    }

    pub fn disk(&self, virtual_path: &str) -> PathBuf {
        self.root().join(virtual_path)
    }

    /// Write a file directly on disk, bypassing the catalog.
    pub fn put(&self, virtual_path: &str, contents: &[u8]) {
        let full = self.disk(virtual_path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }

    pub async fn at(&self, path: &str) -> DocumentEntity {
        self.documents
            .find_by_path(path)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("no catalog row at {path}"))
    }

    pub async fn active_paths(&self) -> Vec<String> {
        self.service
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.path)
            .collect()
    }
}
