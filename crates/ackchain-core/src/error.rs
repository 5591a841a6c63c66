//! Error types for the ackchain core.

use thiserror::Error;

/// Errors raised while encoding, signing or verifying signature records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("payload hash mismatch: expected {expected}, got {actual}")]
    PayloadHashMismatch { expected: String, actual: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("nonce generation failed: {0}")]
    NonceGeneration(String),

    /// Raised by signer backends that can fail, such as a remote key service.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Errors raised by checksum format validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumFormatError {
    #[error("unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid {algorithm} checksum length: expected {expected} hex characters, got {got}")]
    InvalidLength {
        algorithm: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("checksum contains non-hex characters")]
    NonHex,
}
