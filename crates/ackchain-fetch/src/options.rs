//! Per-call fetch limits.

use std::time::Duration;

use ackchain_core::ChecksumAlgorithm;

/// Limits and policy for one live checksum computation.
///
/// No `Default`: every caller states its own limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Largest body accepted, in bytes.
    pub max_bytes: u64,
    /// Deadline for the whole operation, redirects and body included.
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Media types accepted, either exact (`application/pdf`) or a wildcard
    /// subtype (`image/*`). `*/*` accepts anything; an empty list disables
    /// the check.
    pub allowed_content_types: Vec<String>,
    pub algorithm: ChecksumAlgorithm,
    /// Allow loopback and private targets. Tests and trusted intranets only.
    pub skip_ssrf_check: bool,
    /// Accept invalid TLS certificates.
    pub insecure_skip_verify: bool,
}

impl FetchOptions {
    /// Whether a response with this `Content-Type` header may be hashed.
    pub fn content_type_allowed(&self, header: Option<&str>) -> bool {
        if self.allowed_content_types.is_empty() {
            return true;
        }
        if self.allowed_content_types.iter().any(|p| p.trim() == "*/*") {
            return true;
        }

        let Some(header) = header else {
            return false;
        };
        let media_type = header
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        self.allowed_content_types.iter().any(|pattern| {
            let pattern = pattern.trim().to_ascii_lowercase();
            match pattern.strip_suffix("/*") {
                Some(top_level) => media_type
                    .split_once('/')
                    .is_some_and(|(kind, _)| kind == top_level),
                None => media_type == pattern,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(allowed: &[&str]) -> FetchOptions {
        FetchOptions {
            max_bytes: 1024,
            timeout: Duration::from_secs(5),
            max_redirects: 3,
            allowed_content_types: allowed.iter().map(|s| s.to_string()).collect(),
            algorithm: ChecksumAlgorithm::Sha256,
            skip_ssrf_check: false,
            insecure_skip_verify: false,
        }
    }

    #[test]
    fn test_exact_match_ignores_parameters_and_case() {
        let opts = options(&["application/pdf"]);
        assert!(opts.content_type_allowed(Some("application/pdf")));
        assert!(opts.content_type_allowed(Some("Application/PDF; charset=binary")));
        assert!(!opts.content_type_allowed(Some("application/pdfx")));
        assert!(!opts.content_type_allowed(None));
    }

    #[test]
    fn test_wildcard_subtype() {
        let opts = options(&["image/*"]);
        assert!(opts.content_type_allowed(Some("image/png")));
        assert!(opts.content_type_allowed(Some("image/svg+xml")));
        assert!(!opts.content_type_allowed(Some("text/html")));
        assert!(!opts.content_type_allowed(Some("imagery/png")));
    }

    #[test]
    fn test_any_and_empty() {
        assert!(options(&["*/*"]).content_type_allowed(Some("text/html")));
        assert!(options(&["*/*"]).content_type_allowed(None));
        assert!(options(&[]).content_type_allowed(None));
    }
}
