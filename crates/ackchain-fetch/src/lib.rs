//! # Ackchain Fetch
//!
//! Computes document checksums from live content at signing time.
//!
//! Fetches are bounded by [`FetchOptions`] (size, time, redirects, media
//! types) and guarded against server-side request forgery: targets must
//! resolve to public addresses, and the connection is pinned to the
//! addresses that passed the check.
//!
//! The body is streamed through the digest and never buffered whole.

pub mod computer;
pub mod error;
pub mod options;
pub mod ssrf;

pub use computer::{ChecksumComputer, ComputedChecksum, HttpChecksumComputer};
pub use error::FetchError;
pub use options::FetchOptions;
