//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use ackchain_core::{ChecksumVerification, Document, NewSignature, Sha256Hash, Signature, SignatureId};

use crate::error::{Result, StoreError};
use crate::traits::{DocumentLookup, SignatureStore, VerificationStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// uniqueness is checked and the record appended under one write lock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Signatures in insertion order.
    signatures: Vec<Signature>,

    /// Last assigned signature id.
    last_id: i64,

    /// Document metadata by id.
    documents: HashMap<String, Document>,

    /// Verification records in insertion order.
    verifications: Vec<ChecksumVerification>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                signatures: Vec::new(),
                last_id: 0,
                documents: HashMap::new(),
                verifications: Vec::new(),
            }),
        }
    }

    /// Register or replace document metadata.
    pub fn insert_document(&self, document: Document) -> Result<()> {
        let mut inner = self.write()?;
        inner.documents.insert(document.doc_id.clone(), document);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignatureStore for MemoryStore {
    async fn create(&self, signature: &NewSignature) -> Result<Signature> {
        let mut inner = self.write()?;

        let duplicate = inner
            .signatures
            .iter()
            .any(|s| s.doc_id == signature.doc_id && s.user.sub == signature.user.sub);
        if duplicate {
            return Err(StoreError::UniqueViolation {
                doc_id: signature.doc_id.clone(),
                user_sub: signature.user.sub.clone(),
            });
        }

        inner.last_id += 1;
        let stored = signature
            .clone()
            .into_stored(SignatureId(inner.last_id), now_millis());
        inner.signatures.push(stored.clone());

        Ok(stored)
    }

    async fn get_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<Option<Signature>> {
        let inner = self.read()?;
        Ok(inner
            .signatures
            .iter()
            .find(|s| s.doc_id == doc_id && s.user.sub == user_sub)
            .cloned())
    }

    async fn get_by_doc(&self, doc_id: &str) -> Result<Vec<Signature>> {
        let inner = self.read()?;
        Ok(inner
            .signatures
            .iter()
            .filter(|s| s.doc_id == doc_id)
            .cloned()
            .collect())
    }

    async fn get_by_user(&self, user_sub: &str) -> Result<Vec<Signature>> {
        let inner = self.read()?;
        Ok(inner
            .signatures
            .iter()
            .filter(|s| s.user.sub == user_sub)
            .cloned()
            .collect())
    }

    async fn exists_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner
            .signatures
            .iter()
            .any(|s| s.doc_id == doc_id && s.user.sub == user_sub))
    }

    async fn check_status_by_identifier(&self, doc_id: &str, identifier: &str) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner.signatures.iter().any(|s| {
            s.doc_id == doc_id
                && (s.user.sub == identifier || s.user.email.eq_ignore_ascii_case(identifier))
        }))
    }

    async fn get_last_for_doc(&self, doc_id: &str) -> Result<Option<Signature>> {
        let inner = self.read()?;
        Ok(inner
            .signatures
            .iter()
            .rev()
            .find(|s| s.doc_id == doc_id)
            .cloned())
    }

    async fn get_all_ordered(&self) -> Result<Vec<Signature>> {
        let inner = self.read()?;
        Ok(inner.signatures.clone())
    }

    async fn update_prev_hash(&self, id: SignatureId, prev_hash: Option<Sha256Hash>) -> Result<()> {
        let mut inner = self.write()?;
        let record = inner
            .signatures
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("signature {}", id)))?;
        record.prev_hash = prev_hash;
        Ok(())
    }
}

#[async_trait]
impl DocumentLookup for MemoryStore {
    async fn get_document(&self, doc_id: &str) -> Result<Option<Document>> {
        let inner = self.read()?;
        Ok(inner.documents.get(doc_id).cloned())
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn record_verification(&self, verification: &ChecksumVerification) -> Result<()> {
        let mut inner = self.write()?;
        inner.verifications.push(verification.clone());
        Ok(())
    }

    async fn get_verification_history(
        &self,
        doc_id: &str,
        limit: usize,
    ) -> Result<Vec<ChecksumVerification>> {
        let inner = self.read()?;

        // Later inserts win ties on verified_at.
        let mut matching: Vec<(usize, &ChecksumVerification)> = inner
            .verifications
            .iter()
            .enumerate()
            .filter(|(_, v)| v.doc_id == doc_id)
            .collect();
        matching.sort_by(|a, b| {
            b.1.verified_at
                .cmp(&a.1.verified_at)
                .then_with(|| b.0.cmp(&a.0))
        });

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn get_last_verification(&self, doc_id: &str) -> Result<Option<ChecksumVerification>> {
        Ok(self
            .get_verification_history(doc_id, 1)
            .await?
            .into_iter()
            .next())
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ackchain_core::{CryptoSigner, Ed25519Signer, Keypair, Nonce, UserIdentity, HASH_VERSION};

    fn make_new_signature(doc_id: &str, sub: &str) -> NewSignature {
        let signer = Ed25519Signer::new(Keypair::from_seed(&[0x42; 32]));
        let user = UserIdentity::new(sub, format!("{}@example.com", sub), sub);
        let nonce = Nonce::from_bytes([0x01; 32]);
        let signed = signer
            .sign(doc_id, &user, 1_736_870_400_000, &nonce, None)
            .unwrap();

        NewSignature {
            doc_id: doc_id.into(),
            user,
            signed_at: 1_736_870_400_000,
            doc_checksum: None,
            payload_hash: signed.payload_hash,
            signature: signed.signature,
            nonce,
            referer: None,
            prev_hash: None,
            hash_version: HASH_VERSION,
        }
    }

    fn verification(doc_id: &str, verified_at: i64, is_valid: bool) -> ChecksumVerification {
        ChecksumVerification {
            doc_id: doc_id.into(),
            verified_by: "auditor".into(),
            verified_at,
            stored_checksum: "aa".repeat(32),
            calculated_checksum: "bb".repeat(32),
            algorithm: "SHA-256".into(),
            is_valid,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();

        let first = store.create(&make_new_signature("doc-1", "alice")).await.unwrap();
        let second = store.create(&make_new_signature("doc-1", "bob")).await.unwrap();
        assert_eq!(first.id, SignatureId(1));
        assert_eq!(second.id, SignatureId(2));

        let retrieved = store.get_by_doc_and_user("doc-1", "alice").await.unwrap().unwrap();
        assert_eq!(retrieved, first);

        let last = store.get_last_for_doc("doc-1").await.unwrap().unwrap();
        assert_eq!(last.id, second.id);
        assert!(store.get_last_for_doc("doc-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_unique_violation() {
        let store = MemoryStore::new();
        store.create(&make_new_signature("doc-1", "alice")).await.unwrap();

        let err = store
            .create(&make_new_signature("doc-1", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));

        // Same user on another document is fine.
        store.create(&make_new_signature("doc-2", "alice")).await.unwrap();
        assert_eq!(store.get_by_user("alice").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_check_status_by_identifier() {
        let store = MemoryStore::new();
        store.create(&make_new_signature("doc-1", "alice")).await.unwrap();

        assert!(store.check_status_by_identifier("doc-1", "alice").await.unwrap());
        assert!(store
            .check_status_by_identifier("doc-1", "ALICE@example.com")
            .await
            .unwrap());
        assert!(!store.check_status_by_identifier("doc-1", "bob").await.unwrap());
        assert!(!store.check_status_by_identifier("doc-2", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_prev_hash() {
        let store = MemoryStore::new();
        let sig = store.create(&make_new_signature("doc-1", "alice")).await.unwrap();

        let link = Sha256Hash::from_bytes([0x09; 32]);
        store.update_prev_hash(sig.id, Some(link)).await.unwrap();
        let all = store.get_all_ordered().await.unwrap();
        assert_eq!(all[0].prev_hash, Some(link));

        let err = store.update_prev_hash(SignatureId(99), None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_verification_history_newest_first() {
        let store = MemoryStore::new();
        store.record_verification(&verification("doc-1", 100, true)).await.unwrap();
        store.record_verification(&verification("doc-1", 300, false)).await.unwrap();
        store.record_verification(&verification("doc-2", 400, true)).await.unwrap();
        store.record_verification(&verification("doc-1", 200, true)).await.unwrap();

        let history = store.get_verification_history("doc-1", 10).await.unwrap();
        let times: Vec<i64> = history.iter().map(|v| v.verified_at).collect();
        assert_eq!(times, vec![300, 200, 100]);

        let limited = store.get_verification_history("doc-1", 2).await.unwrap();
        assert_eq!(limited.len(), 2);

        let last = store.get_last_verification("doc-1").await.unwrap().unwrap();
        assert_eq!(last.verified_at, 300);
        assert!(store.get_last_verification("doc-9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_documents() {
        let store = MemoryStore::new();
        store
            .insert_document(Document {
                doc_id: "doc-1".into(),
                url: Some("https://docs.example.com/policy.pdf".into()),
                checksum: None,
                checksum_algorithm: None,
            })
            .unwrap();

        assert!(store.get_document("doc-1").await.unwrap().is_some());
        assert!(store.get_document("doc-2").await.unwrap().is_none());
    }
}
