//! Service configuration.

use ackchain_fetch::FetchOptions;

/// What signing does when the live checksum cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InconclusivePolicy {
    /// Log, then sign with the stored checksum bound (fail open).
    #[default]
    Proceed,
    /// Refuse to sign with `ServiceError::IntegrityUnverifiable`.
    Reject,
}

/// Live document integrity check performed before signing.
#[derive(Debug, Clone)]
pub struct IntegrityCheckConfig {
    /// Limits for fetching the document. The algorithm is taken from the
    /// document's own checksum metadata.
    pub fetch: FetchOptions,
    pub on_inconclusive: InconclusivePolicy,
}

impl IntegrityCheckConfig {
    /// Check with the default (fail-open) policy.
    pub fn new(fetch: FetchOptions) -> Self {
        Self {
            fetch,
            on_inconclusive: InconclusivePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InconclusivePolicy) -> Self {
        self.on_inconclusive = policy;
        self
    }
}

/// Configuration for the signature service.
///
/// The default performs no live integrity check: signatures bind whatever
/// checksum the document metadata carries.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub integrity_check: Option<IntegrityCheckConfig>,
}

impl ServiceConfig {
    pub fn with_integrity_check(check: IntegrityCheckConfig) -> Self {
        Self {
            integrity_check: Some(check),
        }
    }
}
