//! # Ackchain Store
//!
//! Storage abstraction for ackchain. Provides trait-based interfaces for
//! signature persistence, document lookup and the checksum verification
//! audit trail, with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`SignatureStore`] - Append-only signature persistence
//! - [`DocumentLookup`] - Read-only document metadata
//! - [`VerificationStore`] - Append-only checksum verification records
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ackchain_store::{SignatureStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("ackchain.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let all = store.get_all_ordered().await.unwrap();
//!     assert!(all.is_empty());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Uniqueness**: one signature per (document, user subject), enforced by
//!   the backend and reported as `StoreError::UniqueViolation`
//! - **Append-only**: signatures are never deleted; `prev_hash` is the only
//!   column a chain rebuild may rewrite. SQLite enforces both with triggers.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DocumentLookup, SignatureStore, VerificationStore};
