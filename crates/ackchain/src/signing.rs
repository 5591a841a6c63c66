//! The signature service: creates acknowledgments and answers queries about them.
//!
//! Creating a signature validates the caller, optionally re-checks the
//! document against its stored checksum, signs a payload binding the
//! checksum, links the record into the document's hash chain and persists it.

use tracing::{info, warn};

use ackchain_core::{
    checksums_match, verify_signature, ChecksumAlgorithm, CryptoSigner, Document,
    Ed25519PublicKey, NewSignature, Nonce, Signature, UserIdentity, HASH_VERSION,
};
use ackchain_fetch::{ChecksumComputer, FetchOptions};
use ackchain_store::{DocumentLookup, SignatureStore, StoreError};

use crate::config::{InconclusivePolicy, ServiceConfig};
use crate::error::{Result, ServiceError, StoreContext};

/// Creates and queries signatures.
///
/// Generic over its capabilities so tests can substitute any of them. No
/// in-process locking: uniqueness is the store's job.
pub struct SignatureService<S, D, K, C> {
    signatures: S,
    documents: D,
    signer: K,
    computer: C,
    config: ServiceConfig,
}

impl<S, D, K, C> SignatureService<S, D, K, C>
where
    S: SignatureStore,
    D: DocumentLookup,
    K: CryptoSigner,
    C: ChecksumComputer,
{
    pub fn new(signatures: S, documents: D, signer: K, computer: C, config: ServiceConfig) -> Self {
        Self {
            signatures,
            documents,
            signer,
            computer,
            config,
        }
    }

    /// Key that verifies every signature this service creates.
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.signer.public_key()
    }

    /// Record that `user` acknowledged document `doc_id`.
    ///
    /// Fails closed when the live document no longer matches its stored
    /// checksum; nothing is persisted in that case.
    pub async fn create_signature(
        &self,
        user: Option<&UserIdentity>,
        doc_id: &str,
        referer: Option<&str>,
    ) -> Result<Signature> {
        let user = user
            .filter(|u| u.is_valid())
            .ok_or(ServiceError::InvalidUser)?;

        if doc_id.trim().is_empty() {
            return Err(ServiceError::InvalidDocument);
        }

        if self
            .signatures
            .exists_by_doc_and_user(doc_id, &user.sub)
            .await
            .context("check for an existing signature")?
        {
            return Err(ServiceError::AlreadyExists {
                doc_id: doc_id.to_string(),
                user_sub: user.sub.clone(),
            });
        }

        let nonce = Nonce::generate().map_err(ServiceError::Nonce)?;

        let document = match self.documents.get_document(doc_id).await {
            Ok(document) => document,
            Err(e) => {
                warn!(doc_id, error = %e, "document lookup failed, signing without checksum");
                None
            }
        };

        let doc_checksum = match &document {
            Some(document) => self.bound_checksum(document).await?,
            None => None,
        };

        let signed_at = now_millis();
        let signed = self
            .signer
            .sign(doc_id, user, signed_at, &nonce, doc_checksum.as_deref())
            .map_err(ServiceError::Crypto)?;

        let prev_hash = match self
            .signatures
            .get_last_for_doc(doc_id)
            .await
            .context("load the chain head")?
        {
            Some(last) => Some(last.link_hash().map_err(ServiceError::Crypto)?),
            None => None,
        };

        let new = NewSignature {
            doc_id: doc_id.to_string(),
            user: user.clone(),
            signed_at,
            doc_checksum,
            payload_hash: signed.payload_hash,
            signature: signed.signature,
            nonce,
            referer: referer.map(str::to_string),
            prev_hash,
            hash_version: HASH_VERSION,
        };

        let stored = self.signatures.create(&new).await.map_err(|e| match e {
            StoreError::UniqueViolation { doc_id, user_sub } => {
                ServiceError::AlreadyExists { doc_id, user_sub }
            }
            source => ServiceError::Store {
                context: "persist the signature",
                source,
            },
        })?;

        info!(
            doc_id,
            user_sub = %stored.user.sub,
            signature_id = %stored.id,
            checksum_bound = stored.doc_checksum.is_some(),
            "signature created"
        );
        Ok(stored)
    }

    /// Decide which checksum the signature binds, re-checking live content
    /// when configured.
    async fn bound_checksum(&self, document: &Document) -> Result<Option<String>> {
        let Some(stored) = document.reference_checksum() else {
            return Ok(None);
        };

        let url = document.url.as_deref().filter(|u| !u.trim().is_empty());
        let (Some(url), Some(check)) = (url, self.config.integrity_check.as_ref()) else {
            return Ok(Some(stored.to_string()));
        };
        let doc_id = document.doc_id.as_str();

        let computed = match document.algorithm_name().parse::<ChecksumAlgorithm>() {
            Ok(algorithm) => {
                let options = FetchOptions {
                    algorithm,
                    ..check.fetch.clone()
                };
                self.computer.compute(url, &options).await
            }
            Err(e) => {
                warn!(doc_id, error = %e, "cannot recompute document checksum");
                None
            }
        };

        match computed {
            Some(live) if checksums_match(&live.digest_hex, stored) => Ok(Some(stored.to_string())),
            Some(live) => {
                warn!(
                    doc_id,
                    url,
                    expected = stored,
                    actual = %live.digest_hex,
                    "document content changed, refusing to sign"
                );
                Err(ServiceError::DocumentModified {
                    doc_id: doc_id.to_string(),
                    expected: stored.to_string(),
                    actual: live.digest_hex,
                })
            }
            None => match check.on_inconclusive {
                InconclusivePolicy::Proceed => {
                    warn!(doc_id, url, "document integrity inconclusive, binding stored checksum");
                    Ok(Some(stored.to_string()))
                }
                InconclusivePolicy::Reject => Err(ServiceError::IntegrityUnverifiable {
                    doc_id: doc_id.to_string(),
                }),
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the signature of one user on one document.
    pub async fn get_signature(&self, doc_id: &str, user_sub: &str) -> Result<Option<Signature>> {
        self.signatures
            .get_by_doc_and_user(doc_id, user_sub)
            .await
            .context("load the signature")
    }

    /// All signatures of a document, oldest first.
    pub async fn list_document_signatures(&self, doc_id: &str) -> Result<Vec<Signature>> {
        self.signatures
            .get_by_doc(doc_id)
            .await
            .context("list document signatures")
    }

    /// All signatures made by a user, oldest first.
    pub async fn list_user_signatures(&self, user_sub: &str) -> Result<Vec<Signature>> {
        self.signatures
            .get_by_user(user_sub)
            .await
            .context("list user signatures")
    }

    /// Whether the user identified by subject or email has signed the document.
    pub async fn has_signed(&self, doc_id: &str, identifier: &str) -> Result<bool> {
        self.signatures
            .check_status_by_identifier(doc_id, identifier)
            .await
            .context("check signature status")
    }

    /// Check a stored record against this service's public key.
    pub fn verify_signature(&self, record: &Signature) -> Result<()> {
        verify_signature(record, &self.signer.public_key()).map_err(ServiceError::Crypto)
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
