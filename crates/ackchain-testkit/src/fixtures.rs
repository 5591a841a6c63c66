//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;
use std::time::Duration;

use ackchain_core::{
    ChecksumAlgorithm, CryptoSigner, Document, Ed25519PublicKey, Ed25519Signer, Keypair,
    NewSignature, Nonce, Signature, UserIdentity, HASH_VERSION,
};
use ackchain_fetch::FetchOptions;
use ackchain_store::{MemoryStore, SignatureStore};

/// A deterministic signer and an in-memory store.
pub struct TestFixture {
    pub keypair: Keypair,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn signer(&self) -> Ed25519Signer {
        Ed25519Signer::new(self.keypair.clone())
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Register a document in the fixture's store.
    pub fn add_document(&self, doc_id: &str, url: Option<&str>, checksum: Option<&str>) -> Document {
        let document = document(doc_id, url, checksum);
        self.store
            .insert_document(document.clone())
            .expect("memory store lock");
        document
    }

    /// Sign and append a record to the document's chain, bypassing the
    /// signing service. The nonce is derived from the store size so
    /// fixtures stay reproducible.
    pub async fn append(&self, doc_id: &str, user: &UserIdentity, signed_at: i64) -> Signature {
        let count = self.store.get_all_ordered().await.expect("memory store").len();
        let nonce = Nonce::from_bytes([count as u8; 32]);

        let prev_hash = self
            .store
            .get_last_for_doc(doc_id)
            .await
            .expect("memory store")
            .map(|last| last.link_hash().expect("link hash"));

        let signed = self
            .signer()
            .sign(doc_id, user, signed_at, &nonce, None)
            .expect("signing");

        self.store
            .create(&NewSignature {
                doc_id: doc_id.to_string(),
                user: user.clone(),
                signed_at,
                doc_checksum: None,
                payload_hash: signed.payload_hash,
                signature: signed.signature,
                nonce,
                referer: None,
                prev_hash,
                hash_version: HASH_VERSION,
            })
            .await
            .expect("create signature")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Document metadata with a SHA-256 reference checksum.
pub fn document(doc_id: &str, url: Option<&str>, checksum: Option<&str>) -> Document {
    Document {
        doc_id: doc_id.to_string(),
        url: url.map(str::to_string),
        checksum: checksum.map(str::to_string),
        checksum_algorithm: Some(ChecksumAlgorithm::Sha256.as_str().to_string()),
    }
}

/// The `n`th synthetic user: `user-n`, `user-n@example.com`.
pub fn user(n: usize) -> UserIdentity {
    UserIdentity::new(
        format!("user-{}", n),
        format!("user-{}@example.com", n),
        format!("User {}", n),
    )
}

pub fn users(count: usize) -> Vec<UserIdentity> {
    (0..count).map(user).collect()
}

/// Fetch limits suitable for a local mock server.
///
/// The SSRF guard is off because mock servers listen on loopback.
pub fn local_fetch_options() -> FetchOptions {
    FetchOptions {
        max_bytes: 1 << 20,
        timeout: Duration::from_secs(5),
        max_redirects: 3,
        allowed_content_types: vec!["application/pdf".to_string()],
        algorithm: ChecksumAlgorithm::Sha256,
        skip_ssrf_check: true,
        insecure_skip_verify: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ackchain_core::verify_chain;

    #[tokio::test]
    async fn test_append_links_per_document() {
        let fixture = TestFixture::with_seed([7; 32]);
        let a1 = fixture.append("doc-a", &user(1), 1000).await;
        let b1 = fixture.append("doc-b", &user(1), 1001).await;
        let a2 = fixture.append("doc-a", &user(2), 1002).await;

        assert!(a1.is_genesis());
        assert!(b1.is_genesis());
        assert_eq!(a2.prev_hash, Some(a1.link_hash().unwrap()));

        let all = fixture.store.get_all_ordered().await.unwrap();
        assert!(verify_chain(&all).unwrap().is_valid);
    }

    #[test]
    fn test_users_are_valid_and_distinct() {
        let all = users(5);
        assert!(all.iter().all(UserIdentity::is_valid));
        assert_ne!(all[0].sub, all[1].sub);
    }
}
