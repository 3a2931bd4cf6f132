//! Document repository implementation.
//!
//! Single-row reads and writes run directly on the pool. Operations that
//! touch a whole subtree take a `&mut SqliteConnection` so the caller owns
//! the transaction boundary (`pool.begin()` ... `commit()`).

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::DocumentId;
use docvault_entity::document::{DocumentEntity, DocumentStatus, NewDocument};

/// Rows equal to `?1` or below `?1 + '/'`. `?1` is bound once.
const SUBTREE: &str = "(path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/')";

/// Rows strictly below `?1 + '/'`.
const DESCENDANTS: &str = "substr(path, 1, length(?1) + 1) = ?1 || '/'";

/// Repository for catalog document rows.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a catalog transaction.
    pub async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }

    /// Find a document by ID.
    pub async fn find_by_id(&self, id: &DocumentId) -> AppResult<Option<DocumentEntity>> {
        sqlx::query_as::<_, DocumentEntity>("SELECT * FROM documents WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    /// Find a document by ID, failing with `NotFound` when absent.
    pub async fn get(&self, id: &DocumentId) -> AppResult<DocumentEntity> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))
    }

    /// Find the row at `path`, active or trashed. Active rows win.
    pub async fn find_by_path(&self, path: &str) -> AppResult<Option<DocumentEntity>> {
        sqlx::query_as::<_, DocumentEntity>(
            "SELECT * FROM documents WHERE path = ?1 ORDER BY deleted ASC LIMIT 1",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find document by path", e)
        })
    }

    /// Whether any row, active or trashed, occupies `path`.
    pub async fn path_taken(&self, path: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE path = ?1")
            .bind(path)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check path", e))?;
        Ok(count > 0)
    }

    /// The shallowest trashed row at `path` or on the way to it.
    ///
    /// Anything placed below such a row would be purged along with it.
    pub async fn find_trashed_on_path(&self, path: &str) -> AppResult<Option<DocumentEntity>> {
        if path.is_empty() {
            return Ok(None);
        }
        sqlx::query_as::<_, DocumentEntity>(
            "SELECT * FROM documents WHERE deleted = 1 AND \
             (path = ?1 OR substr(?1, 1, length(path) + 1) = path || '/') \
             ORDER BY length(path) ASC LIMIT 1",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check trashed ancestors", e)
        })
    }

    /// Find the document carrying a public share token.
    pub async fn find_by_share_token(&self, token: &str) -> AppResult<Option<DocumentEntity>> {
        sqlx::query_as::<_, DocumentEntity>(
            "SELECT * FROM documents WHERE share_token = ?1 AND is_shared = 1 AND deleted = 0",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find shared document", e)
        })
    }

    /// All non-deleted rows, ordered by path.
    pub async fn list_active(&self) -> AppResult<Vec<DocumentEntity>> {
        sqlx::query_as::<_, DocumentEntity>(
            "SELECT * FROM documents WHERE deleted = 0 ORDER BY path ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list documents", e))
    }

    /// All trashed rows at any nesting level, ordered by path.
    pub async fn list_trashed(&self) -> AppResult<Vec<DocumentEntity>> {
        sqlx::query_as::<_, DocumentEntity>(
            "SELECT * FROM documents WHERE deleted = 1 ORDER BY path ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trash", e))
    }

    /// Active rows at or below `prefix` (`""` means everything).
    pub async fn list_active_under(&self, prefix: &str) -> AppResult<Vec<DocumentEntity>> {
        let query = if prefix.is_empty() {
            sqlx::query_as::<_, DocumentEntity>(
                "SELECT * FROM documents WHERE deleted = 0 ORDER BY path ASC",
            )
        } else {
            sqlx::query_as::<_, DocumentEntity>(
                "SELECT * FROM documents WHERE deleted = 0 AND \
                 (path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/') ORDER BY path ASC",
            )
            .bind(prefix)
        };
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list subtree", e))
    }

    /// Trashed rows at or below `root`, ordered by path.
    pub async fn list_trashed_under(&self, root: &str) -> AppResult<Vec<DocumentEntity>> {
        let sql =
            format!("SELECT * FROM documents WHERE deleted = 1 AND {SUBTREE} ORDER BY path ASC");
        sqlx::query_as::<_, DocumentEntity>(&sql)
            .bind(root)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trash", e))
    }

    /// Number of rows in the catalog, trashed included.
    pub async fn count_all(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count documents", e))
    }

    /// Insert a new row.
    pub async fn create(&self, doc: &NewDocument) -> AppResult<DocumentEntity> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        Self::create_in(&mut conn, doc).await
    }

    /// Insert a new row on the given connection.
    pub async fn create_in(
        conn: &mut SqliteConnection,
        doc: &NewDocument,
    ) -> AppResult<DocumentEntity> {
        sqlx::query_as::<_, DocumentEntity>(
            "INSERT INTO documents (id, name, category, path, doc_type, cloud_source, status, \
             encrypted, file_size, tags, uploaded_at, last_modified, deleted, is_shared, share_token) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, 0, NULL) \
             RETURNING *",
        )
        .bind(&doc.id)
        .bind(&doc.name)
        .bind(&doc.category)
        .bind(&doc.path)
        .bind(doc.doc_type)
        .bind(&doc.cloud_source)
        .bind(doc.status)
        .bind(doc.encrypted)
        .bind(doc.file_size)
        .bind(Json(&doc.tags))
        .bind(doc.uploaded_at)
        .bind(doc.last_modified)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create document", e))
    }

    /// Apply a scan-detected change to a single row.
    pub async fn update_from_scan(
        &self,
        id: &DocumentId,
        name: &str,
        status: DocumentStatus,
        file_size: i64,
        last_modified: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE documents SET name = ?2, status = ?3, file_size = ?4, last_modified = ?5 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(status)
        .bind(file_size)
        .bind(last_modified)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update scanned document", e)
        })?;
        Ok(())
    }

    /// Set the status of a single row.
    pub async fn set_status(&self, id: &DocumentId, status: DocumentStatus) -> AppResult<()> {
        sqlx::query("UPDATE documents SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set status", e))?;
        Ok(())
    }

    /// Replace the tags of a single row.
    pub async fn set_tags(&self, id: &DocumentId, tags: &[String]) -> AppResult<DocumentEntity> {
        sqlx::query_as::<_, DocumentEntity>(
            "UPDATE documents SET tags = ?2 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(Json(tags))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update tags", e))?
        .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))
    }

    /// Set or clear the public share token.
    pub async fn set_share_token(
        &self,
        id: &DocumentId,
        token: Option<&str>,
    ) -> AppResult<DocumentEntity> {
        sqlx::query_as::<_, DocumentEntity>(
            "UPDATE documents SET is_shared = ?2, share_token = ?3 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(token.is_some())
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update sharing", e))?
        .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))
    }

    /// Update a row's own name, path, and modification time.
    pub async fn relocate_in(
        conn: &mut SqliteConnection,
        id: &DocumentId,
        name: &str,
        path: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET name = ?2, path = ?3, last_modified = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(path)
        .bind(now)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to relocate document", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Document {id} not found")));
        }
        Ok(())
    }

    /// Replace the `old` prefix of every descendant path with `new`.
    ///
    /// One set-based statement; the remainder after the prefix is kept
    /// byte-for-byte. Returns the number of rows rewritten.
    pub async fn rewrite_descendant_paths_in(
        conn: &mut SqliteConnection,
        old: &str,
        new: &str,
    ) -> AppResult<u64> {
        let sql = format!(
            "UPDATE documents SET path = ?2 || substr(path, length(?1) + 1) WHERE {DESCENDANTS}"
        );
        sqlx::query(&sql)
            .bind(old)
            .bind(new)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to rewrite subtree paths", e)
            })
    }

    /// Rename the category `old_name` to `new_name` within the subtree at `root`.
    pub async fn rewrite_subtree_category_in(
        conn: &mut SqliteConnection,
        root: &str,
        old_name: &str,
        new_name: &str,
    ) -> AppResult<u64> {
        let sql = format!("UPDATE documents SET category = ?3 WHERE category = ?2 AND {SUBTREE}");
        sqlx::query(&sql)
            .bind(root)
            .bind(old_name)
            .bind(new_name)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to rewrite categories", e)
            })
    }

    /// Set the `deleted` flag on a row and, for a folder path, its subtree.
    pub async fn set_deleted_subtree_in(
        conn: &mut SqliteConnection,
        root: &str,
        deleted: bool,
    ) -> AppResult<u64> {
        let sql = format!("UPDATE documents SET deleted = ?2 WHERE {SUBTREE}");
        sqlx::query(&sql)
            .bind(root)
            .bind(deleted)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to flip deleted flag", e)
            })
    }

    /// Set the `deleted` flag on a single row.
    pub async fn set_deleted_in(
        conn: &mut SqliteConnection,
        id: &DocumentId,
        deleted: bool,
    ) -> AppResult<u64> {
        sqlx::query("UPDATE documents SET deleted = ?2 WHERE id = ?1")
            .bind(id)
            .bind(deleted)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to flip deleted flag", e)
            })
    }

    /// Delete every row at or below `root`.
    pub async fn delete_subtree_in(conn: &mut SqliteConnection, root: &str) -> AppResult<u64> {
        let sql = format!("DELETE FROM documents WHERE {SUBTREE}");
        sqlx::query(&sql)
            .bind(root)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete subtree", e))
    }

    /// Delete the trashed rows at or below `root`; active rows survive.
    pub async fn delete_trashed_subtree_in(
        conn: &mut SqliteConnection,
        root: &str,
    ) -> AppResult<u64> {
        let sql = format!("DELETE FROM documents WHERE deleted = 1 AND {SUBTREE}");
        sqlx::query(&sql)
            .bind(root)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete subtree", e))
    }

    /// Delete a single row.
    pub async fn delete_in(conn: &mut SqliteConnection, id: &DocumentId) -> AppResult<u64> {
        sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete document", e))
    }
}
