//! Live checksum computation over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Response, Url};
use sha2::{Digest, Sha256, Sha512};
use tracing::{debug, warn};

use ackchain_core::ChecksumAlgorithm;

use crate::error::FetchError;
use crate::options::FetchOptions;
use crate::ssrf;

/// A digest computed from live document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedChecksum {
    /// Lowercase hex digest.
    pub digest_hex: String,
    pub algorithm: ChecksumAlgorithm,
}

/// Computes the checksum of a document from its URL.
///
/// `None` means inconclusive: the content could not be obtained within the
/// given limits. It never means "document changed".
#[async_trait]
pub trait ChecksumComputer: Send + Sync {
    async fn compute(&self, url: &str, options: &FetchOptions) -> Option<ComputedChecksum>;
}

#[async_trait]
impl<T: ChecksumComputer + ?Sized> ChecksumComputer for Arc<T> {
    async fn compute(&self, url: &str, options: &FetchOptions) -> Option<ComputedChecksum> {
        (**self).compute(url, options).await
    }
}

/// [`ChecksumComputer`] backed by reqwest.
///
/// Each hop gets a fresh client pinned to the addresses the SSRF guard
/// approved, with automatic redirects disabled so every `Location` is
/// checked again. Proxy environment variables are ignored: a proxy would
/// resolve the host itself and bypass the pin.
#[derive(Debug, Clone, Default)]
pub struct HttpChecksumComputer;

impl HttpChecksumComputer {
    pub fn new() -> Self {
        Self
    }

    /// Like [`ChecksumComputer::compute`], but reports why a fetch failed.
    pub async fn try_compute(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<ComputedChecksum, FetchError> {
        if options.algorithm == ChecksumAlgorithm::Md5 {
            return Err(FetchError::UnsupportedAlgorithm(options.algorithm));
        }

        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        match tokio::time::timeout(options.timeout, self.fetch(url, options)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(options.timeout)),
        }
    }

    async fn fetch(&self, mut url: Url, options: &FetchOptions) -> Result<ComputedChecksum, FetchError> {
        let mut hops = 0;

        loop {
            let response = self.request(&url, options).await?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(FetchError::BadRedirect)?;

                if hops >= options.max_redirects {
                    return Err(FetchError::TooManyRedirects(options.max_redirects));
                }
                hops += 1;

                url = url.join(location).map_err(|_| FetchError::BadRedirect)?;
                debug!(url = %url, hop = hops, "following redirect");
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            return digest_body(response, options).await;
        }
    }

    async fn request(&self, url: &Url, options: &FetchOptions) -> Result<Response, FetchError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        }

        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(format!("{} has no host", url)))?;

        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .danger_accept_invalid_certs(options.insecure_skip_verify);

        if !options.skip_ssrf_check {
            let port = url.port_or_known_default().unwrap_or(80);
            let addrs = ssrf::resolve_public(host, port).await?;
            builder = builder.resolve_to_addrs(host, &addrs);
        }

        debug!(url = %url, "fetching document");
        let client = builder.build()?;
        Ok(client.get(url.clone()).send().await?)
    }
}

#[async_trait]
impl ChecksumComputer for HttpChecksumComputer {
    async fn compute(&self, url: &str, options: &FetchOptions) -> Option<ComputedChecksum> {
        match self.try_compute(url, options).await {
            Ok(computed) => Some(computed),
            Err(e) => {
                warn!(url, error = %e, "live checksum inconclusive");
                None
            }
        }
    }
}

/// Stream the body through the digest, enforcing the type and size limits.
async fn digest_body(
    mut response: Response,
    options: &FetchOptions,
) -> Result<ComputedChecksum, FetchError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if !options.content_type_allowed(content_type.as_deref()) {
        return Err(FetchError::DisallowedContentType(content_type));
    }

    if response.content_length().is_some_and(|len| len > options.max_bytes) {
        return Err(FetchError::TooLarge {
            limit: options.max_bytes,
        });
    }

    let mut hasher = StreamingDigest::new(options.algorithm)?;
    let mut received: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        received += chunk.len() as u64;
        if received > options.max_bytes {
            return Err(FetchError::TooLarge {
                limit: options.max_bytes,
            });
        }
        hasher.update(&chunk);
    }

    Ok(ComputedChecksum {
        digest_hex: hasher.finalize_hex(),
        algorithm: options.algorithm,
    })
}

enum StreamingDigest {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl StreamingDigest {
    fn new(algorithm: ChecksumAlgorithm) -> Result<Self, FetchError> {
        match algorithm {
            ChecksumAlgorithm::Sha256 => Ok(Self::Sha256(Sha256::new())),
            ChecksumAlgorithm::Sha512 => Ok(Self::Sha512(Sha512::new())),
            ChecksumAlgorithm::Md5 => Err(FetchError::UnsupportedAlgorithm(algorithm)),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}
