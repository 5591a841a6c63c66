//! Hash chain verification and rebuild planning.
//!
//! Chains are scoped per document: the first signature of a document is its
//! genesis record and every later signature of that document links to the
//! one before it. Inputs are all signatures in global insertion order; the
//! predecessor of each record is tracked per `doc_id`, so one pass covers
//! every document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::crypto::Sha256Hash;
use crate::error::CoreError;
use crate::signature::Signature;
use crate::types::SignatureId;

/// Outcome of a chain verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIntegrityResult {
    pub is_valid: bool,
    pub total_records: usize,
    /// First record whose `prev_hash` does not match its predecessor.
    pub break_at_id: Option<SignatureId>,
    pub details: String,
}

impl ChainIntegrityResult {
    fn intact(total_records: usize) -> Self {
        Self {
            is_valid: true,
            total_records,
            break_at_id: None,
            details: format!("chain intact across {} records", total_records),
        }
    }

    fn broken(total_records: usize, at: SignatureId, details: String) -> Self {
        Self {
            is_valid: false,
            total_records,
            break_at_id: Some(at),
            details,
        }
    }
}

/// A stored `prev_hash` that a rebuild must overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevHashCorrection {
    pub id: SignatureId,
    pub stored: Option<Sha256Hash>,
    pub expected: Option<Sha256Hash>,
}

/// Verify the chain links of `signatures` (global insertion order).
///
/// Stops at the first broken link. Never mutates anything.
pub fn verify_chain(signatures: &[Signature]) -> Result<ChainIntegrityResult, CoreError> {
    let total = signatures.len();
    let mut heads: HashMap<&str, Sha256Hash> = HashMap::new();

    for sig in signatures {
        let expected = heads.get(sig.doc_id.as_str()).copied();

        if sig.prev_hash != expected {
            let details = match expected {
                None => format!(
                    "signature {} is the first for document {} but carries prev_hash {}",
                    sig.id,
                    sig.doc_id,
                    describe(sig.prev_hash)
                ),
                Some(want) => format!(
                    "signature {} of document {} has prev_hash {}, expected {}",
                    sig.id,
                    sig.doc_id,
                    describe(sig.prev_hash),
                    want
                ),
            };
            return Ok(ChainIntegrityResult::broken(total, sig.id, details));
        }

        heads.insert(sig.doc_id.as_str(), sig.link_hash()?);
    }

    Ok(ChainIntegrityResult::intact(total))
}

fn describe(link: Option<Sha256Hash>) -> String {
    link.map(|h| h.to_hex()).unwrap_or_else(|| "none".to_string())
}

/// Compute the corrections a rebuild has to write.
///
/// Each expected value is derived from the *corrected* predecessor, so a
/// single pass repairs a chain broken at any number of points.
pub fn plan_rebuild(signatures: &[Signature]) -> Result<Vec<PrevHashCorrection>, CoreError> {
    let mut heads: HashMap<&str, Sha256Hash> = HashMap::new();
    let mut corrections = Vec::new();

    for sig in signatures {
        let expected = heads.get(sig.doc_id.as_str()).copied();

        let link = if sig.prev_hash == expected {
            sig.link_hash()?
        } else {
            corrections.push(PrevHashCorrection {
                id: sig.id,
                stored: sig.prev_hash,
                expected,
            });
            let mut corrected = sig.clone();
            corrected.prev_hash = expected;
            corrected.link_hash()?
        };

        heads.insert(sig.doc_id.as_str(), link);
    }

    Ok(corrections)
}
