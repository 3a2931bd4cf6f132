//! History (action log) repository implementation.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::DocumentId;
use docvault_entity::history::{HistoryAction, HistoryEntry};

/// Repository for the append-only `document_history` table.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Create a new history repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an entry stamped with the current time.
    pub async fn append(
        &self,
        document_id: &DocumentId,
        action: HistoryAction,
        details: &str,
    ) -> AppResult<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        Self::append_in(&mut conn, document_id, action, details).await
    }

    /// Append an entry on the given connection.
    pub async fn append_in(
        conn: &mut SqliteConnection,
        document_id: &DocumentId,
        action: HistoryAction,
        details: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO document_history (document_id, action, timestamp, details) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(document_id)
        .bind(action)
        .bind(Utc::now())
        .bind(details)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append history", e))?;
        Ok(())
    }

    /// Entries for a document, newest first.
    pub async fn find_by_document(&self, document_id: &DocumentId) -> AppResult<Vec<HistoryEntry>> {
        sqlx::query_as::<_, HistoryEntry>(
            "SELECT * FROM document_history WHERE document_id = ?1 \
             ORDER BY timestamp DESC, id DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load history", e))
    }

    /// Number of entries for a document.
    pub async fn count_for_document(&self, document_id: &DocumentId) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM document_history WHERE document_id = ?1")
            .bind(document_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count history", e))
    }

    /// Number of entries in the whole log.
    pub async fn count_all(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM document_history")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count history", e))
    }

    /// Remove every entry for one document.
    pub async fn delete_for_document_in(
        conn: &mut SqliteConnection,
        document_id: &DocumentId,
    ) -> AppResult<u64> {
        sqlx::query("DELETE FROM document_history WHERE document_id = ?1")
            .bind(document_id)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete history", e))
    }

    /// Remove every entry whose document lives at or below `root`.
    ///
    /// Must run before the document rows themselves are deleted.
    pub async fn delete_for_subtree_in(conn: &mut SqliteConnection, root: &str) -> AppResult<u64> {
        sqlx::query(
            "DELETE FROM document_history WHERE document_id IN (\
             SELECT id FROM documents \
             WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/')",
        )
        .bind(root)
        .execute(conn)
        .await
        .map(|r| r.rows_affected())
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete history", e))
    }

    /// Remove every entry whose document is trashed and at or below `root`.
    pub async fn delete_for_trashed_subtree_in(
        conn: &mut SqliteConnection,
        root: &str,
    ) -> AppResult<u64> {
        sqlx::query(
            "DELETE FROM document_history WHERE document_id IN (\
             SELECT id FROM documents WHERE deleted = 1 \
             AND (path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'))",
        )
        .bind(root)
        .execute(conn)
        .await
        .map(|r| r.rows_affected())
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete history", e))
    }
}
