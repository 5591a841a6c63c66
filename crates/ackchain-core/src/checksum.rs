//! Checksum algorithms, normalization and format validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChecksumFormatError;

/// Checksum algorithms a document baseline may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    #[default]
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-512")]
    Sha512,
    #[serde(rename = "MD5")]
    Md5,
}

impl ChecksumAlgorithm {
    /// Canonical display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
            Self::Md5 => "MD5",
        }
    }

    /// Number of hex characters in a digest.
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
            Self::Md5 => 32,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ChecksumFormatError;

    /// Accepts `SHA-256`, `sha256`, `Sha_512`, `md5` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match folded.as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            "md5" => Ok(Self::Md5),
            _ => Err(ChecksumFormatError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Strip spaces, hyphens and underscores, then lowercase.
pub fn normalize_checksum(checksum: &str) -> String {
    checksum
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_lowercase()
}

/// Check that `checksum` is a well-formed digest for `algorithm`.
///
/// The checksum is normalized first, so separators and mixed case are
/// accepted. Returns the parsed algorithm on success.
pub fn validate_checksum_format(
    checksum: &str,
    algorithm: &str,
) -> Result<ChecksumAlgorithm, ChecksumFormatError> {
    let algorithm: ChecksumAlgorithm = algorithm.parse()?;
    let normalized = normalize_checksum(checksum);

    if normalized.len() != algorithm.hex_len() {
        return Err(ChecksumFormatError::InvalidLength {
            algorithm: algorithm.as_str(),
            expected: algorithm.hex_len(),
            got: normalized.len(),
        });
    }

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ChecksumFormatError::NonHex);
    }

    Ok(algorithm)
}

/// Compare two checksums after normalization.
pub fn checksums_match(a: &str, b: &str) -> bool {
    normalize_checksum(a) == normalize_checksum(b)
}

/// Append-only audit record of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumVerification {
    pub doc_id: String,
    pub verified_by: String,
    /// Unix milliseconds, UTC.
    pub verified_at: i64,
    pub stored_checksum: String,
    pub calculated_checksum: String,
    pub algorithm: String,
    pub is_valid: bool,
    pub error_message: Option<String>,
}

/// Verdict returned to public verification endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumVerificationResult {
    pub valid: bool,
    pub stored_checksum: Option<String>,
    pub calculated_checksum: String,
    pub algorithm: String,
    pub message: String,
    /// False when the document has no baseline to compare against.
    pub has_reference_hash: bool,
}
