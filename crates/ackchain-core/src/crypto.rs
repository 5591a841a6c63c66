//! Cryptographic primitives for ackchain.
//!
//! Wraps Ed25519 signing and SHA-256 hashing with strong types, and defines
//! the [`CryptoSigner`] capability the signing service depends on.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::canonical::signing_message;
use crate::error::CoreError;
use crate::types::{byte_newtype, Nonce, UserIdentity};

/// SHA-256 digest: payload hashes and chain links.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(pub [u8; 32]);

byte_newtype!(Sha256Hash, 32);

impl Sha256Hash {
    pub fn hash(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hash({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Public half of the service signing key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

byte_newtype!(Ed25519PublicKey, 32);

impl Ed25519PublicKey {
    /// Check `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CoreError> {
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;
        key.verify(message, &Signature::from_bytes(&signature.0))
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", &self.to_hex()[..12])
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

byte_newtype!(Ed25519Signature, 64);

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature({}...)", &self.to_hex()[..12])
    }
}

/// The service's Ed25519 signing key.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key; the seed is the RFC 8032 secret key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    // Never print the secret half.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Keypair").field(&self.public_key()).finish()
    }
}

/// Output of a signing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedPayload {
    /// SHA-256 of the signed message.
    pub payload_hash: Sha256Hash,
    pub signature: Ed25519Signature,
}

/// The signing capability used by the signing service.
///
/// The private key lives behind this trait and never reaches the caller.
/// Implementations must bind all five inputs into the signed message so a
/// signature is meaningless for any other document, signer, time, nonce or
/// checksum. Signing is CPU-bound and synchronous; a remote or hardware
/// backend should do its own blocking off the async runtime.
pub trait CryptoSigner: Send + Sync {
    fn sign(
        &self,
        doc_id: &str,
        user: &UserIdentity,
        signed_at: i64,
        nonce: &Nonce,
        doc_checksum: Option<&str>,
    ) -> Result<SignedPayload, CoreError>;

    /// Key that verifies signatures produced by this signer.
    fn public_key(&self) -> Ed25519PublicKey;
}

/// [`CryptoSigner`] backed by an in-process Ed25519 key.
#[derive(Debug, Clone)]
pub struct Ed25519Signer {
    keypair: Keypair,
}

impl Ed25519Signer {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

impl CryptoSigner for Ed25519Signer {
    fn sign(
        &self,
        doc_id: &str,
        user: &UserIdentity,
        signed_at: i64,
        nonce: &Nonce,
        doc_checksum: Option<&str>,
    ) -> Result<SignedPayload, CoreError> {
        let message = signing_message(doc_id, user, signed_at, nonce, doc_checksum)?;
        Ok(SignedPayload {
            payload_hash: Sha256Hash::hash(&message),
            signature: self.keypair.sign(&message),
        })
    }

    fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserIdentity {
        UserIdentity::new("user-alice", "alice@example.com", "Alice")
    }

    #[test]
    fn test_signature_rejects_other_message_and_key() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"handbook v1");

        assert!(keypair.public_key().verify(b"handbook v1", &signature).is_ok());
        assert!(matches!(
            keypair.public_key().verify(b"handbook v2", &signature),
            Err(CoreError::InvalidSignature)
        ));
        assert!(Keypair::generate()
            .public_key()
            .verify(b"handbook v1", &signature)
            .is_err());
    }

    #[test]
    fn test_seeded_key_is_stable() {
        let key = Keypair::from_seed(&[0x42; 32]).public_key();
        assert_eq!(key, Keypair::from_seed(&[0x42; 32]).public_key());
        assert_eq!(
            key.to_hex(),
            "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12"
        );
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            Sha256Hash::hash(b"hello world").to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_signer_is_deterministic() {
        let signer = Ed25519Signer::new(Keypair::from_seed(&[0x07; 32]));
        let nonce = Nonce::from_bytes([0x11; 32]);

        let a = signer
            .sign("doc-1", &alice(), 1_736_870_400_000, &nonce, Some("abc"))
            .unwrap();
        let b = signer
            .sign("doc-1", &alice(), 1_736_870_400_000, &nonce, Some("abc"))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signer_binds_every_input() {
        let signer = Ed25519Signer::new(Keypair::from_seed(&[0x07; 32]));
        let nonce = Nonce::from_bytes([0x11; 32]);
        let base = signer
            .sign("doc-1", &alice(), 1000, &nonce, Some("abc"))
            .unwrap();

        let bob = UserIdentity::new("user-bob", "bob@example.com", "Bob");
        let variants = [
            signer.sign("doc-2", &alice(), 1000, &nonce, Some("abc")),
            signer.sign("doc-1", &bob, 1000, &nonce, Some("abc")),
            signer.sign("doc-1", &alice(), 1001, &nonce, Some("abc")),
            signer.sign("doc-1", &alice(), 1000, &Nonce::from_bytes([0x12; 32]), Some("abc")),
            signer.sign("doc-1", &alice(), 1000, &nonce, Some("abd")),
            signer.sign("doc-1", &alice(), 1000, &nonce, None),
        ];

        for variant in variants {
            let variant = variant.unwrap();
            assert_ne!(variant.payload_hash, base.payload_hash);
            assert_ne!(variant.signature, base.signature);
        }
    }

    #[test]
    fn test_hash_hex_roundtrip_and_serde() {
        let hash = Sha256Hash::hash(b"data");
        assert_eq!(Sha256Hash::from_hex(&hash.to_hex()).unwrap(), hash);
        assert!(Sha256Hash::from_hex("abcd").is_err());

        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
    }
}
