//! Signature: the record of one user acknowledging one document.
//!
//! A signature is created once and never edited. The only field that may
//! change after persistence is `prev_hash`, and only through an explicit
//! chain rebuild.

use serde::{Deserialize, Serialize};

use crate::canonical::{link_message, signing_message};
use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Sha256Hash};
use crate::error::CoreError;
use crate::types::{Nonce, SignatureId, UserIdentity};

/// Version of the signing and link encodings used for new records.
pub const HASH_VERSION: u16 = 1;

/// A signature that has been signed but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSignature {
    pub doc_id: String,
    pub user: UserIdentity,
    /// Unix milliseconds, UTC.
    pub signed_at: i64,
    /// Document checksum bound into the signed payload.
    pub doc_checksum: Option<String>,
    pub payload_hash: Sha256Hash,
    pub signature: Ed25519Signature,
    pub nonce: Nonce,
    pub referer: Option<String>,
    /// Link hash of the predecessor, `None` for a genesis record.
    pub prev_hash: Option<Sha256Hash>,
    pub hash_version: u16,
}

impl NewSignature {
    /// Attach the store-assigned identity.
    pub fn into_stored(self, id: SignatureId, created_at: i64) -> Signature {
        Signature {
            id,
            doc_id: self.doc_id,
            user: self.user,
            signed_at: self.signed_at,
            doc_checksum: self.doc_checksum,
            payload_hash: self.payload_hash,
            signature: self.signature,
            nonce: self.nonce,
            referer: self.referer,
            prev_hash: self.prev_hash,
            created_at,
            hash_version: self.hash_version,
        }
    }
}

/// A persisted signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub id: SignatureId,
    pub doc_id: String,
    pub user: UserIdentity,
    /// Unix milliseconds, UTC.
    pub signed_at: i64,
    pub doc_checksum: Option<String>,
    pub payload_hash: Sha256Hash,
    pub signature: Ed25519Signature,
    pub nonce: Nonce,
    pub referer: Option<String>,
    pub prev_hash: Option<Sha256Hash>,
    /// Unix milliseconds at which the store accepted the record.
    pub created_at: i64,
    pub hash_version: u16,
}

impl Signature {
    /// Deterministic hash linking a successor to this record.
    pub fn link_hash(&self) -> Result<Sha256Hash, CoreError> {
        Ok(Sha256Hash::hash(&link_message(self)?))
    }

    /// Whether this record starts a chain.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_none()
    }
}

/// Check a stored record against the public key of the service that signed it.
///
/// Recomputes the signed message from the record's own fields, then checks
/// the stored payload hash and the Ed25519 signature over it.
pub fn verify_signature(record: &Signature, public_key: &Ed25519PublicKey) -> Result<(), CoreError> {
    let message = signing_message(
        &record.doc_id,
        &record.user,
        record.signed_at,
        &record.nonce,
        record.doc_checksum.as_deref(),
    )?;

    let computed = Sha256Hash::hash(&message);
    if computed != record.payload_hash {
        return Err(CoreError::PayloadHashMismatch {
            expected: record.payload_hash.to_hex(),
            actual: computed.to_hex(),
        });
    }

    public_key.verify(&message, &record.signature)
}
