//! Error types for document fetching.

use std::net::IpAddr;
use std::time::Duration;

use ackchain_core::ChecksumAlgorithm;
use thiserror::Error;

/// Reasons a live checksum could not be computed.
///
/// Every variant is an inconclusive outcome: none of them says anything
/// about whether the document changed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("could not resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("refusing to fetch {host}: resolves to non-public address {addr}")]
    SsrfBlocked { host: String, addr: IpAddr },

    #[error("content type {} is not allowed", .0.as_deref().unwrap_or("(none)"))]
    DisallowedContentType(Option<String>),

    #[error("document exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("more than {0} redirects")]
    TooManyRedirects(usize),

    #[error("redirect without a usable Location header")]
    BadRedirect,

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("http status {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0} cannot be computed live")]
    UnsupportedAlgorithm(ChecksumAlgorithm),
}
