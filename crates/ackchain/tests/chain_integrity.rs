//! Hash chain audit and repair over a SQLite database file.

use std::path::Path;

use ackchain::core::{Ed25519Signer, Keypair, Sha256Hash};
use ackchain::store::{SignatureStore, SqliteStore};
use ackchain::{ChainService, ServiceConfig, ServiceError, SignatureId, SignatureService};
use ackchain_testkit::{document, user, TestFixture};

fn service(store: &SqliteStore) -> SignatureService<SqliteStore, SqliteStore, Ed25519Signer, NeverFetch> {
    SignatureService::new(
        store.clone(),
        store.clone(),
        Ed25519Signer::new(Keypair::from_seed(&[0x42; 32])),
        NeverFetch,
        ServiceConfig::default(),
    )
}

/// Never consulted: no integrity check is configured.
struct NeverFetch;

#[async_trait::async_trait]
impl ackchain::fetch::ChecksumComputer for NeverFetch {
    async fn compute(
        &self,
        _url: &str,
        _options: &ackchain::fetch::FetchOptions,
    ) -> Option<ackchain::fetch::ComputedChecksum> {
        None
    }
}

/// doc-a: ids 1, 2, 3. doc-b: id 4.
async fn seed(path: &Path) -> SqliteStore {
    let store = SqliteStore::open(path).unwrap();
    store.upsert_document(&document("doc-a", None, None)).await.unwrap();
    store.upsert_document(&document("doc-b", None, None)).await.unwrap();

    let svc = service(&store);
    for (doc, n) in [("doc-a", 1), ("doc-a", 2), ("doc-a", 3), ("doc-b", 1)] {
        svc.create_signature(Some(&user(n)), doc, None).await.unwrap();
    }
    store
}

/// Rewrite a stored email the way someone with raw database access would.
fn tamper_email(path: &Path, id: i64) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch("DROP TRIGGER signatures_prev_hash_only").unwrap();
    conn.execute(
        "UPDATE signatures SET user_email = 'mallory@example.com' WHERE id = ?1",
        [id],
    )
    .unwrap();
}

#[tokio::test]
async fn test_intact_database_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let store = seed(&dir.path().join("ack.db")).await;

    let result = ChainService::new(store).verify_chain().await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.total_records, 4);
    assert_eq!(result.break_at_id, None);
}

#[tokio::test]
async fn test_edit_breaks_chain_at_successor_and_rebuild_repairs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ack.db");
    let store = seed(&path).await;
    tamper_email(&path, 2);

    let chain = ChainService::new(store.clone());
    let broken = chain.verify_chain().await.unwrap();
    assert!(!broken.is_valid);
    assert_eq!(broken.break_at_id, Some(SignatureId(3)));

    let report = chain.rebuild_chain().await.unwrap();
    assert_eq!(report.total_records, 4);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, 0);
    assert!(chain.verify_chain().await.unwrap().is_valid);

    // Relinking hides nothing: the edited record no longer verifies.
    let svc = service(&store);
    let edited = store.get_by_doc_and_user("doc-a", "user-2").await.unwrap().unwrap();
    assert!(matches!(svc.verify_signature(&edited), Err(ServiceError::Crypto(_))));
    let untouched = store.get_by_doc_and_user("doc-a", "user-3").await.unwrap().unwrap();
    svc.verify_signature(&untouched).unwrap();
}

#[tokio::test]
async fn test_chain_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ack.db");
    drop(seed(&path).await);

    let reopened = SqliteStore::open(&path).unwrap();
    let svc = service(&reopened);
    let next = svc.create_signature(Some(&user(4)), "doc-a", None).await.unwrap();

    let previous = reopened.get_by_doc_and_user("doc-a", "user-3").await.unwrap().unwrap();
    assert_eq!(next.prev_hash, Some(previous.link_hash().unwrap()));
    assert_eq!(next.id, SignatureId(5));
    assert!(ChainService::new(reopened).verify_chain().await.unwrap().is_valid);
}

#[tokio::test]
async fn test_duplicate_rejected_after_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = seed(&dir.path().join("ack.db")).await;

    let err = service(&store)
        .create_signature(Some(&user(1)), "doc-a", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists { .. }));
}

#[tokio::test]
async fn test_memory_fixture_rebuild() {
    let fixture = TestFixture::with_seed([9; 32]);
    for n in 0..4 {
        fixture.append("doc-a", &user(n), 1_000 + n as i64).await;
    }
    fixture
        .store
        .update_prev_hash(SignatureId(1), Some(Sha256Hash::from_bytes([1; 32])))
        .await
        .unwrap();

    let chain = ChainService::new(fixture.store.clone());
    let broken = chain.verify_chain().await.unwrap();
    assert_eq!(broken.break_at_id, Some(SignatureId(1)));

    // Genesis restored to None restores its link hash; nothing else moves.
    let report = chain.rebuild_chain().await.unwrap();
    assert_eq!(report.updated, 1);
    assert!(chain.verify_chain().await.unwrap().is_valid);
}
