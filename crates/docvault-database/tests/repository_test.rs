//! Integration tests for the catalog repositories.

use chrono::Utc;
use tempfile::TempDir;

use docvault_core::types::DocumentId;
use docvault_database::DatabasePool;
use docvault_database::migration::run_migrations;
use docvault_database::repositories::{DocumentRepository, HistoryRepository};
use docvault_entity::document::{DocumentStatus, DocumentType, NewDocument, SOURCE_LOCAL};
use docvault_entity::history::HistoryAction;

struct Catalog {
    _dir: TempDir,
    documents: DocumentRepository,
    history: HistoryRepository,
}

async fn catalog() -> Catalog {
    let dir = tempfile::tempdir().unwrap();
    let db = DatabasePool::connect_file(&dir.path().join("catalog.db"))
        .await
        .unwrap();
    run_migrations(db.pool()).await.unwrap();
    Catalog {
        documents: DocumentRepository::new(db.pool().clone()),
        history: HistoryRepository::new(db.pool().clone()),
        _dir: dir,
    }
}

fn file(path: &str, category: &str) -> NewDocument {
    NewDocument {
        id: DocumentId::generate(),
        name: path.rsplit('/').next().unwrap().to_string(),
        category: category.to_string(),
        path: path.to_string(),
        doc_type: DocumentType::File,
        cloud_source: SOURCE_LOCAL.to_string(),
        status: DocumentStatus::Valid,
        encrypted: false,
        file_size: Some(10),
        tags: vec!["a".into(), "b".into()],
        uploaded_at: Utc::now(),
        last_modified: Utc::now(),
    }
}

fn folder(path: &str) -> NewDocument {
    let name = path.rsplit('/').next().unwrap();
    NewDocument::folder(DocumentId::generate(), name, path, name, SOURCE_LOCAL)
}

#[tokio::test]
async fn test_create_round_trips_all_columns() {
    let c = catalog().await;
    let new = file("Finance/tax.pdf", "Finance");
    let created = c.documents.create(&new).await.unwrap();

    assert_eq!(created.id, new.id);
    assert_eq!(created.doc_type, DocumentType::File);
    assert_eq!(created.tag_list(), &["a".to_string(), "b".to_string()]);
    assert!(!created.deleted);
    assert!(created.share_token.is_none());

    let loaded = c.documents.find_by_path("Finance/tax.pdf").await.unwrap().unwrap();
    assert_eq!(loaded.id, new.id);
    assert_eq!(loaded.file_size, Some(10));
}

#[tokio::test]
async fn test_descendant_rewrite_preserves_suffix_and_ignores_lookalikes() {
    let c = catalog().await;
    c.documents.create(&folder("Finance")).await.unwrap();
    c.documents.create(&file("Finance/2024/q1 report.pdf", "2024")).await.unwrap();
    c.documents.create(&file("Finance/tax.pdf", "Finance")).await.unwrap();
    c.documents.create(&file("Finances_old/tax.pdf", "Finances_old")).await.unwrap();
    c.documents.create(&file("Fin%/x.txt", "Fin%")).await.unwrap();

    let mut tx = c.documents.begin().await.unwrap();
    let rewritten =
        DocumentRepository::rewrite_descendant_paths_in(&mut tx, "Finance", "Archive/Money")
            .await
            .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(rewritten, 2);
    let paths: Vec<String> = c
        .documents
        .list_active()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.path)
        .collect();
    assert!(paths.contains(&"Archive/Money/2024/q1 report.pdf".to_string()));
    assert!(paths.contains(&"Archive/Money/tax.pdf".to_string()));
    assert!(paths.contains(&"Finances_old/tax.pdf".to_string()));
    assert!(paths.contains(&"Fin%/x.txt".to_string()));
    // The folder row itself is relocated separately.
    assert!(paths.contains(&"Finance".to_string()));
}

#[tokio::test]
async fn test_subtree_category_rewrite_is_scoped() {
    let c = catalog().await;
    c.documents.create(&folder("Finance")).await.unwrap();
    c.documents.create(&file("Finance/tax.pdf", "Finance")).await.unwrap();
    c.documents.create(&file("Other/Finance.txt", "Finance")).await.unwrap();

    let mut tx = c.documents.begin().await.unwrap();
    let changed =
        DocumentRepository::rewrite_subtree_category_in(&mut tx, "Finance", "Finance", "Money")
            .await
            .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(changed, 2);
    let outside = c.documents.find_by_path("Other/Finance.txt").await.unwrap().unwrap();
    assert_eq!(outside.category, "Finance");
}

#[tokio::test]
async fn test_soft_delete_subtree_flips_every_row() {
    let c = catalog().await;
    c.documents.create(&folder("Finance")).await.unwrap();
    c.documents.create(&file("Finance/a.pdf", "Finance")).await.unwrap();
    c.documents.create(&file("Finance/deep/b.pdf", "deep")).await.unwrap();
    c.documents.create(&file("Finance2/c.pdf", "Finance2")).await.unwrap();

    let mut tx = c.documents.begin().await.unwrap();
    let flipped = DocumentRepository::set_deleted_subtree_in(&mut tx, "Finance", true)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(flipped, 3);
    assert_eq!(c.documents.list_trashed().await.unwrap().len(), 3);
    assert_eq!(c.documents.list_active().await.unwrap().len(), 1);
    assert!(c.documents.path_taken("Finance/a.pdf").await.unwrap());
}

#[tokio::test]
async fn test_uncommitted_transaction_leaves_no_trace() {
    let c = catalog().await;
    c.documents.create(&folder("Finance")).await.unwrap();
    c.documents.create(&file("Finance/a.pdf", "Finance")).await.unwrap();

    {
        let mut tx = c.documents.begin().await.unwrap();
        DocumentRepository::set_deleted_subtree_in(&mut tx, "Finance", true)
            .await
            .unwrap();
        tx.rollback().await.unwrap();
    }

    assert!(c.documents.list_trashed().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purge_subtree_removes_rows_and_history() {
    let c = catalog().await;
    let root = c.documents.create(&folder("Finance")).await.unwrap();
    let child = c.documents.create(&file("Finance/a.pdf", "Finance")).await.unwrap();
    let outside = c.documents.create(&file("Other/a.pdf", "Other")).await.unwrap();
    for id in [&root.id, &child.id, &outside.id] {
        c.history.append(id, HistoryAction::Sync, "seed").await.unwrap();
    }

    let mut tx = c.documents.begin().await.unwrap();
    let history = HistoryRepository::delete_for_subtree_in(&mut tx, "Finance")
        .await
        .unwrap();
    let rows = DocumentRepository::delete_subtree_in(&mut tx, "Finance").await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!((rows, history), (2, 2));
    assert_eq!(c.documents.count_all().await.unwrap(), 1);
    assert_eq!(c.history.count_for_document(&outside.id).await.unwrap(), 1);
    assert_eq!(c.history.count_for_document(&child.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_trashed_purge_spares_active_rows_in_subtree() {
    let c = catalog().await;
    let root = c.documents.create(&folder("Finance")).await.unwrap();
    let kept = c.documents.create(&file("Finance/a.pdf", "Finance")).await.unwrap();
    let gone = c.documents.create(&file("Finance/b.pdf", "Finance")).await.unwrap();
    for id in [&root.id, &kept.id, &gone.id] {
        c.history.append(id, HistoryAction::Sync, "seed").await.unwrap();
    }

    let mut tx = c.documents.begin().await.unwrap();
    DocumentRepository::set_deleted_subtree_in(&mut tx, "Finance", true)
        .await
        .unwrap();
    DocumentRepository::set_deleted_in(&mut tx, &kept.id, false)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let trashed: Vec<String> = c
        .documents
        .list_trashed_under("Finance")
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.path)
        .collect();
    assert_eq!(trashed, ["Finance", "Finance/b.pdf"]);

    let mut tx = c.documents.begin().await.unwrap();
    let history = HistoryRepository::delete_for_trashed_subtree_in(&mut tx, "Finance")
        .await
        .unwrap();
    let rows = DocumentRepository::delete_trashed_subtree_in(&mut tx, "Finance")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!((rows, history), (2, 2));
    assert!(c.documents.find_by_id(&kept.id).await.unwrap().is_some());
    assert_eq!(c.history.count_for_document(&kept.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_trashed_on_path_finds_shallowest_trashed_ancestor() {
    let c = catalog().await;
    c.documents.create(&folder("Finance")).await.unwrap();
    c.documents.create(&folder("Finance/2024")).await.unwrap();
    c.documents.create(&folder("Finance2")).await.unwrap();

    assert!(c.documents.find_trashed_on_path("Finance/2024/q1").await.unwrap().is_none());

    let mut tx = c.documents.begin().await.unwrap();
    DocumentRepository::set_deleted_subtree_in(&mut tx, "Finance", true)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let hit = c
        .documents
        .find_trashed_on_path("Finance/2024/q1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.path, "Finance");
    assert_eq!(
        c.documents.find_trashed_on_path("Finance").await.unwrap().unwrap().path,
        "Finance"
    );
    assert!(c.documents.find_trashed_on_path("Finance2").await.unwrap().is_none());
    assert!(c.documents.find_trashed_on_path("").await.unwrap().is_none());
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let c = catalog().await;
    let doc = c.documents.create(&file("a.txt", "General")).await.unwrap();
    c.history.append(&doc.id, HistoryAction::Create, "one").await.unwrap();
    c.history.append(&doc.id, HistoryAction::Rename, "two").await.unwrap();

    let entries = c.history.find_by_document(&doc.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].details, "two");
    assert_eq!(entries[0].action, HistoryAction::Rename);
}

#[tokio::test]
async fn test_share_token_lookup() {
    let c = catalog().await;
    let doc = c.documents.create(&file("a.txt", "General")).await.unwrap();

    let shared = c.documents.set_share_token(&doc.id, Some("abc")).await.unwrap();
    assert!(shared.is_shared);
    assert_eq!(
        c.documents.find_by_share_token("abc").await.unwrap().map(|d| d.id),
        Some(doc.id.clone())
    );

    let unshared = c.documents.set_share_token(&doc.id, None).await.unwrap();
    assert!(!unshared.is_shared);
    assert!(c.documents.find_by_share_token("abc").await.unwrap().is_none());
}
