//! Encrypted uploads, content reads, tags, and sharing.

mod helpers;

use bytes::Bytes;
use futures::StreamExt;

use docvault_core::error::ErrorKind;
use docvault_core::types::DocumentId;
use docvault_entity::document::{DocumentStatus, SOURCE_UPLOAD};
use docvault_service::{DocumentService, UploadRequest};

use helpers::{vault, vault_with};

fn upload(parent: &str, name: &str, data: Vec<u8>) -> UploadRequest {
    UploadRequest {
        parent_path: parent.to_string(),
        name: name.to_string(),
        category: None,
        data: Bytes::from(data),
    }
}

async fn read_all(service: &DocumentService, id: &DocumentId) -> std::io::Result<Vec<u8>> {
    let mut content = service.read_content(id).await.unwrap();
    let mut out = Vec::new();
    while let Some(chunk) = content.stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[tokio::test]
async fn test_encrypted_upload_round_trips() {
    let v = vault().await;
    let data = sample(100_000);

    let doc = v
        .service
        .write_upload(upload("Finance", "tax.pdf", data.clone()))
        .await
        .unwrap();

    assert!(doc.encrypted);
    assert_eq!(doc.file_size, Some(100_000));
    assert_eq!(doc.cloud_source, SOURCE_UPLOAD);
    assert_eq!(doc.category, "Finance");
    assert_eq!(doc.path, "Finance/tax.pdf");

    let on_disk = std::fs::read(v.disk("Finance/tax.pdf")).unwrap();
    assert_eq!(on_disk.len(), 100_000 + 32);
    assert!(on_disk.windows(64).all(|w| w != &data[..64]));

    let content = v.service.read_content(&doc.id).await.unwrap();
    assert_eq!(content.mime, "application/pdf");
    assert_eq!(content.size, Some(100_000));
    assert_eq!(read_all(&v.service, &doc.id).await.unwrap(), data);

    // Scanning sees the container but keeps the plaintext size.
    assert_eq!(v.service.scan("", None).await.unwrap().mutations(), 1);
    assert_eq!(v.at("Finance/tax.pdf").await.file_size, Some(100_000));
}

#[tokio::test]
async fn test_tampered_tag_fails_the_stream() {
    let v = vault().await;
    let doc = v
        .service
        .write_upload(upload("", "secret.txt", b"attack at dawn".to_vec()))
        .await
        .unwrap();

    let mut raw = std::fs::read(v.disk("secret.txt")).unwrap();
    raw[20] ^= 0x01;
    std::fs::write(v.disk("secret.txt"), &raw).unwrap();

    let err = read_all(&v.service, &doc.id).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[tokio::test]
async fn test_truncated_container_is_a_decryption_error() {
    let v = vault().await;
    let doc = v
        .service
        .write_upload(upload("", "short.txt", b"payload".to_vec()))
        .await
        .unwrap();
    std::fs::write(v.disk("short.txt"), [0u8; 10]).unwrap();

    let err = v.service.read_content(&doc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Decryption);
}

#[tokio::test]
async fn test_plain_upload_is_stored_verbatim() {
    let v = vault_with(false).await;
    let doc = v
        .service
        .write_upload(upload("", "notes.md", b"# hi".to_vec()))
        .await
        .unwrap();

    assert!(!doc.encrypted);
    assert_eq!(doc.category, "General");
    assert_eq!(std::fs::read(v.disk("notes.md")).unwrap(), b"# hi");
    assert_eq!(read_all(&v.service, &doc.id).await.unwrap(), b"# hi");
    assert_eq!(
        v.service.read_content(&doc.id).await.unwrap().mime,
        "text/markdown"
    );
}

#[tokio::test]
async fn test_upload_guards() {
    let v = vault().await;
    v.service
        .write_upload(upload("", "a.txt", b"a".to_vec()))
        .await
        .unwrap();

    let err = v
        .service
        .write_upload(upload("", "a.txt", b"again".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = v
        .service
        .write_upload(upload("", "big.bin", vec![0u8; 1024 * 1024 + 1]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(!v.disk("big.bin").exists());

    let err = v
        .service
        .write_upload(upload("../escape", "x.txt", b"x".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let empty = v
        .service
        .write_upload(upload("", "empty.txt", Vec::new()))
        .await
        .unwrap();
    assert_eq!(empty.status, DocumentStatus::Corrupted);
}

#[tokio::test]
async fn test_reading_vanished_content_marks_missing() {
    let v = vault().await;
    let doc = v
        .service
        .write_upload(upload("", "a.txt", b"a".to_vec()))
        .await
        .unwrap();
    std::fs::remove_file(v.disk("a.txt")).unwrap();

    let err = v.service.read_content(&doc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(
        v.service.get(&doc.id).await.unwrap().status,
        DocumentStatus::Missing
    );
}

#[tokio::test]
async fn test_folders_and_trashed_rows_have_no_content() {
    let v = vault().await;
    let folder = v.service.create_folder("Docs", "").await.unwrap();
    let err = v.service.read_content(&folder.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let doc = v
        .service
        .write_upload(upload("Docs", "a.txt", b"a".to_vec()))
        .await
        .unwrap();
    v.service.soft_delete(&doc.id).await.unwrap();
    let err = v.service.read_content(&doc.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_tags_are_cleaned_and_logged() {
    let v = vault().await;
    let doc = v
        .service
        .write_upload(upload("", "a.txt", b"a".to_vec()))
        .await
        .unwrap();

    let tags: Vec<String> = [" tax", "2024", "tax", ""].into_iter().map(String::from).collect();
    let updated = v.service.update_tags(&doc.id, &tags).await.unwrap();
    assert_eq!(updated.tag_list(), ["tax".to_string(), "2024".to_string()]);

    let history = v.service.history(&doc.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].details, "Tags set to [tax, 2024]");
}

#[tokio::test]
async fn test_share_token_lifecycle() {
    let v = vault().await;
    let doc = v
        .service
        .write_upload(upload("", "a.txt", b"a".to_vec()))
        .await
        .unwrap();

    let token = v.service.share(&doc.id).await.unwrap();
    assert_eq!(token.len(), 64);
    assert_eq!(v.service.share(&doc.id).await.unwrap(), token);
    assert_eq!(
        v.service.find_by_share_token(&token).await.unwrap().id,
        doc.id
    );

    let unshared = v.service.unshare(&doc.id).await.unwrap();
    assert!(!unshared.is_shared);
    assert_eq!(
        v.service.find_by_share_token(&token).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
}
