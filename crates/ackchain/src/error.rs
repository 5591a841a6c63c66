//! Error types for the ackchain services.

use ackchain_core::{ChecksumFormatError, CoreError};
use ackchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Identity absent, blank subject, or email without `@`.
    #[error("user identity is missing or invalid")]
    InvalidUser,

    #[error("document id is missing")]
    InvalidDocument,

    #[error("user {user_sub} has already signed document {doc_id}")]
    AlreadyExists { doc_id: String, user_sub: String },

    /// Live content no longer matches the stored checksum.
    #[error("document {doc_id} was modified: expected checksum {expected}, computed {actual}")]
    DocumentModified {
        doc_id: String,
        expected: String,
        actual: String,
    },

    /// Live checksum unavailable and the policy refuses to sign blind.
    #[error("integrity of document {doc_id} could not be verified")]
    IntegrityUnverifiable { doc_id: String },

    #[error("live checksum of document {doc_id} could not be computed")]
    FetchInconclusive { doc_id: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid checksum format: {0}")]
    InvalidFormat(String),

    #[error("nonce generation failed: {0}")]
    Nonce(#[source] CoreError),

    #[error("cryptographic error: {0}")]
    Crypto(#[source] CoreError),

    #[error("storage error while trying to {context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    /// Whether signing was refused because the document's integrity check
    /// failed closed, as opposed to bad input or infrastructure failure.
    pub fn blocks_signing_by_policy(&self) -> bool {
        matches!(
            self,
            Self::DocumentModified { .. } | Self::IntegrityUnverifiable { .. }
        )
    }
}

impl From<ChecksumFormatError> for ServiceError {
    fn from(err: ChecksumFormatError) -> Self {
        match err {
            ChecksumFormatError::UnsupportedAlgorithm(name) => Self::UnsupportedAlgorithm(name),
            other => Self::InvalidFormat(other.to_string()),
        }
    }
}

/// Attach an operation description to store failures.
pub(crate) trait StoreContext<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> StoreContext<T> for std::result::Result<T, StoreError> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|source| ServiceError::Store { context, source })
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_errors() {
        let modified = ServiceError::DocumentModified {
            doc_id: "doc".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert!(modified.blocks_signing_by_policy());
        assert!(ServiceError::IntegrityUnverifiable { doc_id: "doc".into() }.blocks_signing_by_policy());
        assert!(!ServiceError::InvalidUser.blocks_signing_by_policy());
        assert!(!ServiceError::FetchInconclusive { doc_id: "doc".into() }.blocks_signing_by_policy());
    }

    #[test]
    fn test_format_error_mapping() {
        let err: ServiceError = ChecksumFormatError::UnsupportedAlgorithm("CRC32".into()).into();
        assert!(matches!(err, ServiceError::UnsupportedAlgorithm(ref n) if n == "CRC32"));

        let err: ServiceError = ChecksumFormatError::NonHex.into();
        assert!(matches!(err, ServiceError::InvalidFormat(_)));
    }

    #[test]
    fn test_store_context() {
        let result: std::result::Result<(), StoreError> = Err(StoreError::Poisoned);
        let err = result.context("load signatures").unwrap_err();
        assert_eq!(
            err.to_string(),
            "storage error while trying to load signatures: store lock poisoned"
        );
    }
}
