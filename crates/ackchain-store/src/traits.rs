//! Store traits: the abstract interfaces for signature persistence.
//!
//! These traits keep the services storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use ackchain_core::{ChecksumVerification, Document, NewSignature, Sha256Hash, Signature, SignatureId};

use crate::error::Result;

/// Persistence for signature records.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Uniqueness**: at most one signature per `(doc_id, user.sub)`. A second
///   `create` for the same pair fails with `StoreError::UniqueViolation`.
/// - **Insertion order**: ids grow with every insert; lists are returned in
///   ascending id order.
/// - **Append-only**: records are never deleted, and `update_prev_hash` is
///   the only mutation.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    /// Persist a new signature and return it with its assigned id.
    async fn create(&self, signature: &NewSignature) -> Result<Signature>;

    /// Get the signature of one user on one document.
    async fn get_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<Option<Signature>>;

    /// All signatures of a document, oldest first.
    async fn get_by_doc(&self, doc_id: &str) -> Result<Vec<Signature>>;

    /// All signatures made by a user, oldest first.
    async fn get_by_user(&self, user_sub: &str) -> Result<Vec<Signature>>;

    /// Whether the user has signed the document.
    async fn exists_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<bool>;

    /// Whether a signature exists whose subject or email (case-insensitive)
    /// equals `identifier`.
    async fn check_status_by_identifier(&self, doc_id: &str, identifier: &str) -> Result<bool>;

    /// The most recently inserted signature of a document.
    async fn get_last_for_doc(&self, doc_id: &str) -> Result<Option<Signature>>;

    /// Every signature in insertion order.
    async fn get_all_ordered(&self) -> Result<Vec<Signature>>;

    /// Overwrite the stored `prev_hash` of one record.
    ///
    /// Returns `StoreError::NotFound` if no record has this id.
    async fn update_prev_hash(&self, id: SignatureId, prev_hash: Option<Sha256Hash>) -> Result<()>;
}

/// Read-only access to document metadata.
#[async_trait]
pub trait DocumentLookup: Send + Sync {
    async fn get_document(&self, doc_id: &str) -> Result<Option<Document>>;
}

/// Append-only audit trail of checksum verifications.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn record_verification(&self, verification: &ChecksumVerification) -> Result<()>;

    /// Verifications of a document, newest first, at most `limit` records.
    async fn get_verification_history(
        &self,
        doc_id: &str,
        limit: usize,
    ) -> Result<Vec<ChecksumVerification>>;

    async fn get_last_verification(&self, doc_id: &str) -> Result<Option<ChecksumVerification>>;
}

#[async_trait]
impl<T: SignatureStore + ?Sized> SignatureStore for Arc<T> {
    async fn create(&self, signature: &NewSignature) -> Result<Signature> {
        (**self).create(signature).await
    }

    async fn get_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<Option<Signature>> {
        (**self).get_by_doc_and_user(doc_id, user_sub).await
    }

    async fn get_by_doc(&self, doc_id: &str) -> Result<Vec<Signature>> {
        (**self).get_by_doc(doc_id).await
    }

    async fn get_by_user(&self, user_sub: &str) -> Result<Vec<Signature>> {
        (**self).get_by_user(user_sub).await
    }

    async fn exists_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<bool> {
        (**self).exists_by_doc_and_user(doc_id, user_sub).await
    }

    async fn check_status_by_identifier(&self, doc_id: &str, identifier: &str) -> Result<bool> {
        (**self).check_status_by_identifier(doc_id, identifier).await
    }

    async fn get_last_for_doc(&self, doc_id: &str) -> Result<Option<Signature>> {
        (**self).get_last_for_doc(doc_id).await
    }

    async fn get_all_ordered(&self) -> Result<Vec<Signature>> {
        (**self).get_all_ordered().await
    }

    async fn update_prev_hash(&self, id: SignatureId, prev_hash: Option<Sha256Hash>) -> Result<()> {
        (**self).update_prev_hash(id, prev_hash).await
    }
}

#[async_trait]
impl<T: DocumentLookup + ?Sized> DocumentLookup for Arc<T> {
    async fn get_document(&self, doc_id: &str) -> Result<Option<Document>> {
        (**self).get_document(doc_id).await
    }
}

#[async_trait]
impl<T: VerificationStore + ?Sized> VerificationStore for Arc<T> {
    async fn record_verification(&self, verification: &ChecksumVerification) -> Result<()> {
        (**self).record_verification(verification).await
    }

    async fn get_verification_history(
        &self,
        doc_id: &str,
        limit: usize,
    ) -> Result<Vec<ChecksumVerification>> {
        (**self).get_verification_history(doc_id, limit).await
    }

    async fn get_last_verification(&self, doc_id: &str) -> Result<Option<ChecksumVerification>> {
        (**self).get_last_verification(doc_id).await
    }
}
