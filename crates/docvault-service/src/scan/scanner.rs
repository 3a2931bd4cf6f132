//! Reconciliation scanner.
//!
//! Walks a physical directory with an explicit stack, inserting rows for
//! newly discovered entries and updating rows whose disk state changed.
//! Every catalog write is a single-row statement so the walk never holds a
//! transaction while API operations run alongside it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use docvault_core::config::ScannerConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::storage::{StorageObjectMeta, StorageProvider};
use docvault_core::types::DocumentId;
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::{
    DocumentEntity, DocumentStatus, DocumentType, NewDocument, SOURCE_LOCAL,
};
use docvault_entity::history::HistoryAction;
use docvault_storage::crypto::HEADER_LEN;
use docvault_storage::path;

use super::report::ScanReport;

/// Discovers and reconciles catalog rows from disk state.
#[derive(Debug, Clone)]
pub struct ScanService {
    /// Document repository.
    documents: Arc<DocumentRepository>,
    /// History repository.
    history: Arc<HistoryRepository>,
    /// Physical tree.
    storage: Arc<dyn StorageProvider>,
    /// Walk settings.
    config: ScannerConfig,
}

impl ScanService {
    /// Creates a new scan service.
    pub fn new(
        documents: Arc<DocumentRepository>,
        history: Arc<HistoryRepository>,
        storage: Arc<dyn StorageProvider>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            documents,
            history,
            storage,
            config,
        }
    }

    /// Category given to files directly inside a scan root when the caller
    /// does not name one.
    pub fn default_category(&self) -> &str {
        &self.config.default_category
    }

    /// Scan `root` (a virtual directory path, `""` for the storage root).
    ///
    /// Per-entry failures are logged and counted, never propagated. The
    /// walk is bounded by the configured timeout; a scan that times out
    /// keeps the rows it already wrote and skips missing detection.
    pub async fn scan(&self, root: &str, category: Option<&str>) -> AppResult<ScanReport> {
        let root = path::normalize(root)?;
        let category = category.unwrap_or(&self.config.default_category).to_string();

        if !root.is_empty() {
            let meta = self.storage.metadata(&root).await?;
            if !meta.is_directory || meta.is_symlink {
                return Err(AppError::validation(format!(
                    "Scan root '{root}' is not a directory"
                )));
            }
        }

        info!(root = %root, category = %category, "Starting catalog scan");

        let mut report = ScanReport::default();
        let mut seen = HashSet::new();
        let budget = Duration::from_secs(self.config.timeout_seconds);

        let walk = self.walk(&root, &category, &mut report, &mut seen);
        if tokio::time::timeout(budget, walk).await.is_err() {
            warn!(
                root = %root,
                timeout_seconds = self.config.timeout_seconds,
                directories = report.directories,
                files = report.files,
                inserted = report.inserted,
                updated = report.updated,
                "Catalog scan timed out"
            );
            return Err(AppError::timeout(format!(
                "Scan of '{root}' exceeded {}s",
                self.config.timeout_seconds
            )));
        }

        self.mark_missing(&root, &seen, &mut report).await;

        info!(
            root = %root,
            directories = report.directories,
            files = report.files,
            inserted = report.inserted,
            updated = report.updated,
            marked_missing = report.marked_missing,
            errors = report.errors,
            "Catalog scan completed"
        );
        Ok(report)
    }

    async fn walk(
        &self,
        root: &str,
        category: &str,
        report: &mut ScanReport,
        seen: &mut HashSet<String>,
    ) {
        let yield_every = self.config.yield_every.max(1);
        let mut visited = 0usize;
        let mut stack = vec![(root.to_string(), category.to_string())];

        while let Some((dir, dir_category)) = stack.pop() {
            let entries = match self.storage.list(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %dir, error = %e, "Skipping unreadable directory");
                    report.errors += 1;
                    continue;
                }
            };

            for entry in entries {
                visited += 1;
                if visited % yield_every == 0 {
                    tokio::task::yield_now().await;
                }

                if entry.is_symlink {
                    debug!(path = %entry.path, "Not following symlink");
                    continue;
                }

                if entry.is_directory {
                    if self.is_skipped(&entry.name) {
                        debug!(path = %entry.path, "Skipping excluded directory");
                        continue;
                    }
                    report.directories += 1;
                    seen.insert(entry.path.clone());
                    if let Err(e) = self.reconcile_directory(&entry, report).await {
                        warn!(path = %entry.path, error = %e, "Failed to reconcile directory");
                        report.errors += 1;
                    }
                    stack.push((entry.path.clone(), entry.name.clone()));
                } else {
                    report.files += 1;
                    seen.insert(entry.path.clone());
                    if let Err(e) = self.reconcile_file(&entry, &dir_category, report).await {
                        warn!(path = %entry.path, error = %e, "Failed to reconcile file");
                        report.errors += 1;
                    }
                }
            }
        }
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.config.skip_directories.iter().any(|s| s == name)
    }

    async fn reconcile_directory(
        &self,
        entry: &StorageObjectMeta,
        report: &mut ScanReport,
    ) -> AppResult<()> {
        match self.documents.find_by_path(&entry.path).await? {
            None => {
                let now = Utc::now();
                let doc = NewDocument {
                    id: DocumentId::generate(),
                    name: entry.name.clone(),
                    category: entry.name.clone(),
                    path: entry.path.clone(),
                    doc_type: DocumentType::Folder,
                    cloud_source: SOURCE_LOCAL.to_string(),
                    status: DocumentStatus::Valid,
                    encrypted: false,
                    file_size: None,
                    tags: Vec::new(),
                    uploaded_at: now,
                    last_modified: entry.last_modified.unwrap_or(now),
                };
                let created = self.documents.create(&doc).await?;
                self.history
                    .append(&created.id, HistoryAction::Sync, "Initial scan discovery")
                    .await?;
                debug!(document_id = %created.id, path = %created.path, "Discovered folder");
                report.inserted += 1;
            }
            Some(existing) if existing.status != DocumentStatus::Valid && !existing.deleted => {
                self.documents
                    .set_status(&existing.id, DocumentStatus::Valid)
                    .await?;
                self.history
                    .append(&existing.id, HistoryAction::Sync, "Folder present on disk again")
                    .await?;
                report.updated += 1;
            }
            Some(_) => {}
        }
        Ok(())
    }

    async fn reconcile_file(
        &self,
        entry: &StorageObjectMeta,
        category: &str,
        report: &mut ScanReport,
    ) -> AppResult<()> {
        let modified = entry.last_modified.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let Some(existing) = self.documents.find_by_path(&entry.path).await? else {
            let doc = NewDocument {
                id: DocumentId::generate(),
                name: entry.name.clone(),
                category: category.to_string(),
                path: entry.path.clone(),
                doc_type: DocumentType::File,
                cloud_source: SOURCE_LOCAL.to_string(),
                status: DocumentStatus::for_size(entry.size_bytes),
                encrypted: false,
                file_size: Some(entry.size_bytes as i64),
                tags: Vec::new(),
                uploaded_at: Utc::now(),
                last_modified: modified,
            };
            let created = self.documents.create(&doc).await?;
            self.history
                .append(&created.id, HistoryAction::Sync, "Initial scan discovery")
                .await?;
            debug!(document_id = %created.id, path = %created.path, "Discovered file");
            report.inserted += 1;
            return Ok(());
        };

        if existing.doc_type != DocumentType::File {
            debug!(path = %entry.path, "Catalog folder now a file on disk, leaving row alone");
            return Ok(());
        }

        let (status, plain_size) = observed_state(&existing, entry.size_bytes);
        if existing.last_modified == modified && existing.status == status {
            return Ok(());
        }

        self.documents
            .update_from_scan(&existing.id, &entry.name, status, plain_size as i64, modified)
            .await?;
        self.history
            .append(
                &existing.id,
                HistoryAction::Update,
                &format!("Disk change detected (status {status})"),
            )
            .await?;
        debug!(document_id = %existing.id, path = %entry.path, "Updated from disk");
        report.updated += 1;
        Ok(())
    }

    /// Flip active rows below `root` that the walk did not see to `missing`.
    async fn mark_missing(&self, root: &str, seen: &HashSet<String>, report: &mut ScanReport) {
        let rows = match self.documents.list_active_under(root).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(root = %root, error = %e, "Skipping missing detection");
                report.errors += 1;
                return;
            }
        };

        for row in rows {
            if row.path == root
                || row.status == DocumentStatus::Missing
                || seen.contains(&row.path)
                || row.path.split('/').any(|segment| self.is_skipped(segment))
            {
                continue;
            }

            // The row may have been written after its directory was listed.
            match self.storage.exists(&row.path).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!(path = %row.path, error = %e, "Failed to check for missing entry");
                    report.errors += 1;
                    continue;
                }
            }

            let result = async {
                self.documents
                    .set_status(&row.id, DocumentStatus::Missing)
                    .await?;
                self.history
                    .append(&row.id, HistoryAction::Sync, "Not found on disk")
                    .await
            }
            .await;

            match result {
                Ok(()) => {
                    info!(document_id = %row.id, path = %row.path, "Marked missing");
                    report.marked_missing += 1;
                }
                Err(e) => {
                    warn!(document_id = %row.id, error = %e, "Failed to mark missing");
                    report.errors += 1;
                }
            }
        }
    }
}

/// Status and plaintext size implied by the on-disk length.
fn observed_state(row: &DocumentEntity, disk_size: u64) -> (DocumentStatus, u64) {
    if !row.encrypted {
        return (DocumentStatus::for_size(disk_size), disk_size);
    }
    let header = HEADER_LEN as u64;
    if disk_size < header {
        (DocumentStatus::Corrupted, 0)
    } else {
        let plain = disk_size - header;
        (DocumentStatus::for_size(plain), plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn row(encrypted: bool) -> DocumentEntity {
        DocumentEntity {
            id: DocumentId::generate(),
            name: "a.bin".into(),
            category: "General".into(),
            path: "a.bin".into(),
            doc_type: DocumentType::File,
            cloud_source: SOURCE_LOCAL.into(),
            status: DocumentStatus::Valid,
            encrypted,
            file_size: Some(1),
            tags: Json(Vec::new()),
            uploaded_at: Utc::now(),
            last_modified: Utc::now(),
            deleted: false,
            is_shared: false,
            share_token: None,
        }
    }

    #[test]
    fn zero_bytes_is_corrupted() {
        assert_eq!(observed_state(&row(false), 0), (DocumentStatus::Corrupted, 0));
        assert_eq!(observed_state(&row(false), 9), (DocumentStatus::Valid, 9));
    }

    #[test]
    fn encrypted_size_excludes_header() {
        let header = HEADER_LEN as u64;
        assert_eq!(observed_state(&row(true), header + 5), (DocumentStatus::Valid, 5));
        assert_eq!(observed_state(&row(true), header), (DocumentStatus::Corrupted, 0));
        assert_eq!(observed_state(&row(true), 3), (DocumentStatus::Corrupted, 0));
    }
}
