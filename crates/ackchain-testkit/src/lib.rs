//! # ackchain testkit
//!
//! Testing utilities for ackchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: fixed signing inputs with their expected payload
//!   hash, signature and link hash, plus checksum digests of known bodies
//! - **Generators**: Proptest strategies for identities, documents and
//!   signed records
//! - **Fixtures**: a seeded signer over an in-memory store
//!
//! ## Golden Vectors
//!
//! ```rust
//! use ackchain_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, payload_hash) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, payload_hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ackchain_testkit::generators::{record_from_params, SigningParams};
//!
//! proptest! {
//!     #[test]
//!     fn link_hash_is_deterministic(params: SigningParams) {
//!         let r1 = record_from_params(&params);
//!         let r2 = record_from_params(&params);
//!         prop_assert_eq!(r1.link_hash().unwrap(), r2.link_hash().unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ackchain_testkit::fixtures::{user, TestFixture};
//!
//! # async fn example() {
//! let fixture = TestFixture::with_seed([7; 32]);
//! fixture.add_document("handbook", None, None);
//! let record = fixture.append("handbook", &user(1), 1_736_870_400_000).await;
//! assert!(record.is_genesis());
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{document, local_fetch_options, user, users, TestFixture};
pub use generators::{record_from_params, SigningParams};
pub use vectors::{
    checksum_vectors, record_from_vector, signing_vectors, verify_all_vectors, ChecksumVector,
    SigningVector, CHAINED_LINK,
};
