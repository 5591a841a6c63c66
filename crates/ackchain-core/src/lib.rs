//! # Ackchain Core
//!
//! Pure primitives for tamper-evident document acknowledgments: signature
//! records, canonical signed payloads, chain link hashes and checksum formats.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Signature`] - A persisted acknowledgment of one document by one user
//! - [`CryptoSigner`] - The signing capability; keys never leave it
//! - [`ChainIntegrityResult`] - Outcome of walking the per-document chains
//! - [`ChecksumAlgorithm`] - Supported document checksum algorithms
//!
//! ## Canonicalization
//!
//! Signed payloads and link hashes are computed over deterministic CBOR.
//! See the [`canonical`] module.

pub mod canonical;
pub mod chain;
pub mod checksum;
pub mod crypto;
pub mod error;
pub mod signature;
pub mod types;

pub use canonical::{link_message, signing_message, LINK_DOMAIN, SIGN_DOMAIN};
pub use chain::{plan_rebuild, verify_chain, ChainIntegrityResult, PrevHashCorrection};
pub use checksum::{
    checksums_match, normalize_checksum, validate_checksum_format, ChecksumAlgorithm,
    ChecksumVerification, ChecksumVerificationResult,
};
pub use crypto::{
    CryptoSigner, Ed25519PublicKey, Ed25519Signature, Ed25519Signer, Keypair, Sha256Hash,
    SignedPayload,
};
pub use error::{ChecksumFormatError, CoreError};
pub use signature::{verify_signature, NewSignature, Signature, HASH_VERSION};
pub use types::{Document, Nonce, SignatureId, UserIdentity};
