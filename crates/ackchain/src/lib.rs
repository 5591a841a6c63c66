//! # ackchain
//!
//! Tamper-evident acknowledgments: a user states "I have read this
//! document", and the record proves who acknowledged which version, when.
//!
//! ## Overview
//!
//! - **Signatures**: Ed25519 over a canonical payload binding the user, the
//!   document, a timestamp, a nonce and the document checksum
//! - **Integrity check**: before signing, the live document can be fetched
//!   and hashed; a mismatch refuses the signature
//! - **Hash chain**: every signature of a document links to the one before
//!   it, so edits in storage are detectable and repairable by an admin
//! - **Checksum audits**: caller-supplied or live-computed checksums are
//!   compared with the reference, and every attempt is recorded
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ackchain::{SignatureService, ServiceConfig};
//! use ackchain::core::{Ed25519Signer, Keypair, UserIdentity};
//! use ackchain::fetch::HttpChecksumComputer;
//! use ackchain::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("ackchain.db").unwrap();
//!     let signer = Ed25519Signer::new(Keypair::generate());
//!
//!     let service = SignatureService::new(
//!         store.clone(),
//!         store,
//!         signer,
//!         HttpChecksumComputer::new(),
//!         ServiceConfig::default(),
//!     );
//!
//!     let alice = UserIdentity::new("user-alice", "alice@example.com", "Alice");
//!     let record = service
//!         .create_signature(Some(&alice), "handbook-2025", None)
//!         .await
//!         .unwrap();
//!     service.verify_signature(&record).unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ackchain::core` - records, canonical encoding, Ed25519, chain math
//! - `ackchain::store` - storage traits, SQLite and in-memory stores
//! - `ackchain::fetch` - SSRF-guarded live checksum computation

pub mod chain;
pub mod checksum;
pub mod config;
pub mod error;
pub mod signing;

pub use ackchain_core as core;
pub use ackchain_fetch as fetch;
pub use ackchain_store as store;

pub use chain::{ChainService, RebuildReport};
pub use checksum::{ChecksumService, DEFAULT_HISTORY_LIMIT};
pub use config::{InconclusivePolicy, IntegrityCheckConfig, ServiceConfig};
pub use error::{Result, ServiceError};
pub use signing::SignatureService;

pub use ackchain_core::{
    ChainIntegrityResult, ChecksumAlgorithm, ChecksumVerification, ChecksumVerificationResult,
    Document, Ed25519PublicKey, Signature, SignatureId, UserIdentity,
};
