//! Administrative hash chain audit and repair.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ackchain_core::{plan_rebuild, verify_chain, ChainIntegrityResult};
use ackchain_store::SignatureStore;

use crate::error::{Result, ServiceError, StoreContext};

/// Summary of a rebuild pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub total_records: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Audits and repairs the `prev_hash` links of stored signatures.
pub struct ChainService<S> {
    signatures: S,
}

impl<S: SignatureStore> ChainService<S> {
    pub fn new(signatures: S) -> Self {
        Self { signatures }
    }

    /// Walk every stored signature and report the first broken link.
    pub async fn verify_chain(&self) -> Result<ChainIntegrityResult> {
        let all = self
            .signatures
            .get_all_ordered()
            .await
            .context("load signatures")?;

        let result = verify_chain(&all).map_err(ServiceError::Crypto)?;
        if !result.is_valid {
            warn!(
                break_at = ?result.break_at_id,
                details = %result.details,
                "hash chain broken"
            );
        }
        Ok(result)
    }

    /// Recompute every `prev_hash` and overwrite the ones that differ.
    ///
    /// A failed update is counted and logged; the pass continues.
    pub async fn rebuild_chain(&self) -> Result<RebuildReport> {
        let all = self
            .signatures
            .get_all_ordered()
            .await
            .context("load signatures")?;

        let corrections = plan_rebuild(&all).map_err(ServiceError::Crypto)?;
        let mut report = RebuildReport {
            total_records: all.len(),
            ..RebuildReport::default()
        };

        for correction in corrections {
            match self
                .signatures
                .update_prev_hash(correction.id, correction.expected)
                .await
            {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(id = %correction.id, error = %e, "failed to update prev_hash");
                    report.failed += 1;
                }
            }
        }

        info!(
            total = report.total_records,
            updated = report.updated,
            failed = report.failed,
            "hash chain rebuilt"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use ackchain_core::{
        Document, Ed25519Signer, Keypair, NewSignature, Sha256Hash, Signature, SignatureId,
        UserIdentity,
    };
    use ackchain_fetch::{ChecksumComputer, ComputedChecksum, FetchOptions};
    use ackchain_store::{MemoryStore, StoreError};

    use crate::config::ServiceConfig;
    use crate::signing::SignatureService;

    struct NoFetch;

    #[async_trait]
    impl ChecksumComputer for NoFetch {
        async fn compute(&self, _url: &str, _options: &FetchOptions) -> Option<ComputedChecksum> {
            None
        }
    }

    async fn seeded(entries: &[(&str, &str)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let svc = SignatureService::new(
            store.clone(),
            store.clone(),
            Ed25519Signer::new(Keypair::from_seed(&[7; 32])),
            NoFetch,
            ServiceConfig::default(),
        );

        for (doc, sub) in entries {
            store
                .insert_document(Document {
                    doc_id: doc.to_string(),
                    url: None,
                    checksum: None,
                    checksum_algorithm: None,
                })
                .unwrap();
            let user = UserIdentity::new(*sub, format!("{}@example.com", sub), *sub);
            svc.create_signature(Some(&user), doc, None).await.unwrap();
        }
        store
    }

    /// Refuses prev_hash updates for one id.
    struct StubbornStore {
        inner: Arc<MemoryStore>,
        refuse: SignatureId,
    }

    #[async_trait]
    impl SignatureStore for StubbornStore {
        async fn create(&self, signature: &NewSignature) -> ackchain_store::Result<Signature> {
            self.inner.create(signature).await
        }
        async fn get_by_doc_and_user(
            &self,
            doc_id: &str,
            user_sub: &str,
        ) -> ackchain_store::Result<Option<Signature>> {
            self.inner.get_by_doc_and_user(doc_id, user_sub).await
        }
        async fn get_by_doc(&self, doc_id: &str) -> ackchain_store::Result<Vec<Signature>> {
            self.inner.get_by_doc(doc_id).await
        }
        async fn get_by_user(&self, user_sub: &str) -> ackchain_store::Result<Vec<Signature>> {
            self.inner.get_by_user(user_sub).await
        }
        async fn exists_by_doc_and_user(
            &self,
            doc_id: &str,
            user_sub: &str,
        ) -> ackchain_store::Result<bool> {
            self.inner.exists_by_doc_and_user(doc_id, user_sub).await
        }
        async fn check_status_by_identifier(
            &self,
            doc_id: &str,
            identifier: &str,
        ) -> ackchain_store::Result<bool> {
            self.inner.check_status_by_identifier(doc_id, identifier).await
        }
        async fn get_last_for_doc(&self, doc_id: &str) -> ackchain_store::Result<Option<Signature>> {
            self.inner.get_last_for_doc(doc_id).await
        }
        async fn get_all_ordered(&self) -> ackchain_store::Result<Vec<Signature>> {
            self.inner.get_all_ordered().await
        }
        async fn update_prev_hash(
            &self,
            id: SignatureId,
            prev_hash: Option<Sha256Hash>,
        ) -> ackchain_store::Result<()> {
            if id == self.refuse {
                return Err(StoreError::NotFound(format!("signature {}", id)));
            }
            self.inner.update_prev_hash(id, prev_hash).await
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_valid() {
        let chain = ChainService::new(Arc::new(MemoryStore::new()));
        let result = chain.verify_chain().await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.total_records, 0);

        let report = chain.rebuild_chain().await.unwrap();
        assert_eq!(report, RebuildReport::default());
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({ "total_records": 0, "updated": 0, "failed": 0 })
        );
    }

    #[tokio::test]
    async fn test_intact_chain_rebuild_is_noop() {
        let store = seeded(&[("doc-a", "u1"), ("doc-b", "u1"), ("doc-a", "u2")]).await;
        let chain = ChainService::new(store);

        let result = chain.verify_chain().await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.total_records, 3);

        let report = chain.rebuild_chain().await.unwrap();
        assert_eq!(report.total_records, 3);
        assert_eq!(report.updated, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_rebuild_repairs_broken_links() {
        let store = seeded(&[("doc-a", "u1"), ("doc-a", "u2"), ("doc-a", "u3")]).await;
        store
            .update_prev_hash(SignatureId(2), Some(Sha256Hash::from_bytes([0xAB; 32])))
            .await
            .unwrap();

        let chain = ChainService::new(store.clone());
        let broken = chain.verify_chain().await.unwrap();
        assert!(!broken.is_valid);
        assert_eq!(broken.break_at_id, Some(SignatureId(2)));

        // Restoring record 2 restores its link hash, so record 3 is untouched.
        let report = chain.rebuild_chain().await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 0);
        assert!(chain.verify_chain().await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_rebuild_counts_failures() {
        let store = seeded(&[("doc-a", "u1"), ("doc-a", "u2")]).await;
        store.update_prev_hash(SignatureId(2), None).await.unwrap();

        let chain = ChainService::new(StubbornStore {
            inner: store,
            refuse: SignatureId(2),
        });
        let report = chain.rebuild_chain().await.unwrap();
        assert_eq!(report.total_records, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(report.failed, 1);
        assert!(!chain.verify_chain().await.unwrap().is_valid);
    }
}
