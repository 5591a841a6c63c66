//! Checksum verification against a document's reference checksum.

use tracing::warn;

use ackchain_core::{
    checksums_match, validate_checksum_format, ChecksumAlgorithm, ChecksumVerification,
    ChecksumVerificationResult, Document,
};
use ackchain_fetch::{ChecksumComputer, FetchOptions};
use ackchain_store::{DocumentLookup, VerificationStore};

use crate::error::{Result, ServiceError, StoreContext};
use crate::signing::now_millis;

/// History length used when the caller passes a non-positive limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Verifies caller-supplied checksums and keeps the audit trail.
///
/// Audit writes are best effort: a failed write is logged and the verdict
/// still returned.
pub struct ChecksumService<D, V> {
    documents: D,
    verifications: V,
}

impl<D, V> ChecksumService<D, V>
where
    D: DocumentLookup,
    V: VerificationStore,
{
    pub fn new(documents: D, verifications: V) -> Self {
        Self {
            documents,
            verifications,
        }
    }

    /// Compare `calculated` with the reference checksum of `doc_id`.
    pub async fn verify(
        &self,
        doc_id: &str,
        calculated: &str,
        verified_by: &str,
    ) -> Result<ChecksumVerificationResult> {
        let document = self.load_document(doc_id).await?;
        let algorithm = document.algorithm_name().to_string();

        if let Err(e) = validate_checksum_format(calculated, &algorithm) {
            self.record(ChecksumVerification {
                doc_id: doc_id.to_string(),
                verified_by: verified_by.to_string(),
                verified_at: now_millis(),
                stored_checksum: document.checksum.clone().unwrap_or_default(),
                calculated_checksum: calculated.to_string(),
                algorithm,
                is_valid: false,
                error_message: Some(e.to_string()),
            })
            .await;
            return Err(e.into());
        }

        let Some(stored) = document.reference_checksum() else {
            return Ok(ChecksumVerificationResult {
                valid: false,
                stored_checksum: None,
                calculated_checksum: calculated.to_string(),
                algorithm,
                message: "document has no reference checksum to compare against".into(),
                has_reference_hash: false,
            });
        };

        let valid = checksums_match(stored, calculated);
        let message = if valid {
            "checksum matches the reference".to_string()
        } else {
            "checksum does not match the reference; the document may have been modified".to_string()
        };

        self.record(ChecksumVerification {
            doc_id: doc_id.to_string(),
            verified_by: verified_by.to_string(),
            verified_at: now_millis(),
            stored_checksum: stored.to_string(),
            calculated_checksum: calculated.to_string(),
            algorithm: algorithm.clone(),
            is_valid: valid,
            error_message: (!valid).then(|| message.clone()),
        })
        .await;

        Ok(ChecksumVerificationResult {
            valid,
            stored_checksum: Some(stored.to_string()),
            calculated_checksum: calculated.to_string(),
            algorithm,
            message,
            has_reference_hash: true,
        })
    }

    /// Fetch the document live and verify the result.
    pub async fn verify_remote<C>(
        &self,
        doc_id: &str,
        verified_by: &str,
        computer: &C,
        options: &FetchOptions,
    ) -> Result<ChecksumVerificationResult>
    where
        C: ChecksumComputer + ?Sized,
    {
        let document = self.load_document(doc_id).await?;

        let Some(url) = document.url.as_deref().filter(|u| !u.trim().is_empty()) else {
            warn!(doc_id, "document has no url to fetch");
            return Err(ServiceError::FetchInconclusive {
                doc_id: doc_id.to_string(),
            });
        };

        let algorithm: ChecksumAlgorithm = document.algorithm_name().parse()?;
        let options = FetchOptions {
            algorithm,
            ..options.clone()
        };

        let computed = computer
            .compute(url, &options)
            .await
            .ok_or_else(|| ServiceError::FetchInconclusive {
                doc_id: doc_id.to_string(),
            })?;

        self.verify(doc_id, &computed.digest_hex, verified_by).await
    }

    /// Verifications of a document, newest first. `limit <= 0` means
    /// [`DEFAULT_HISTORY_LIMIT`].
    pub async fn get_verification_history(
        &self,
        doc_id: &str,
        limit: i64,
    ) -> Result<Vec<ChecksumVerification>> {
        let limit = usize::try_from(limit)
            .ok()
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        self.verifications
            .get_verification_history(doc_id, limit)
            .await
            .context("load verification history")
    }

    pub async fn get_last_verification(&self, doc_id: &str) -> Result<Option<ChecksumVerification>> {
        self.verifications
            .get_last_verification(doc_id)
            .await
            .context("load the last verification")
    }

    async fn load_document(&self, doc_id: &str) -> Result<Document> {
        self.documents
            .get_document(doc_id)
            .await
            .context("load the document")?
            .ok_or_else(|| ServiceError::NotFound(format!("document {}", doc_id)))
    }

    async fn record(&self, verification: ChecksumVerification) {
        if let Err(e) = self.verifications.record_verification(&verification).await {
            warn!(
                doc_id = %verification.doc_id,
                error = %e,
                "failed to record checksum verification"
            );
        }
    }
}
