//! Golden test vectors.
//!
//! The expected values pin the canonical signing message, the Ed25519
//! signature over it and the chain link hash. Any change to the encodings
//! shows up here before it reaches a stored record.

use ackchain_core::{
    ChecksumAlgorithm, CryptoSigner, Ed25519Signer, Keypair, NewSignature, Nonce, Sha256Hash,
    Signature, SignatureId, UserIdentity, HASH_VERSION,
};

/// A body with its expected digest.
#[derive(Debug, Clone)]
pub struct ChecksumVector {
    pub name: &'static str,
    pub body: &'static [u8],
    pub algorithm: ChecksumAlgorithm,
    pub expected_hex: &'static str,
}

/// All checksum vectors.
pub fn checksum_vectors() -> Vec<ChecksumVector> {
    vec![
        ChecksumVector {
            name: "sample pdf body, SHA-256",
            body: b"Sample PDF content",
            algorithm: ChecksumAlgorithm::Sha256,
            expected_hex: "b3b4e8714358cc79990c5c83391172e01c3e79a1b456d7e0c570cbf59da30e23",
        },
        ChecksumVector {
            name: "sample pdf body, SHA-512",
            body: b"Sample PDF content",
            algorithm: ChecksumAlgorithm::Sha512,
            expected_hex: "37bfb8e9b492be2957413e7070cd566092fe0d2655e53a9526fb7786129a5a0d\
                           2c50422e695dcc026770ca9c0c20c1ff923baabec8279af0513a93ff8cfb2b71",
        },
        ChecksumVector {
            name: "empty body, SHA-256",
            body: b"",
            algorithm: ChecksumAlgorithm::Sha256,
            expected_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        ChecksumVector {
            name: "empty body, SHA-512",
            body: b"",
            algorithm: ChecksumAlgorithm::Sha512,
            expected_hex: "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
                           47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e",
        },
        ChecksumVector {
            name: "hello world, SHA-256",
            body: b"hello world",
            algorithm: ChecksumAlgorithm::Sha256,
            expected_hex: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        },
    ]
}

/// One signing operation with every input fixed.
#[derive(Debug, Clone)]
pub struct SigningVector {
    pub name: &'static str,
    pub seed: [u8; 32],
    pub doc_id: &'static str,
    pub user_sub: &'static str,
    pub user_email: &'static str,
    pub user_name: &'static str,
    pub signed_at: i64,
    pub nonce: [u8; 32],
    pub doc_checksum: Option<&'static str>,
    pub expected_public_key: &'static str,
    pub expected_payload_hash: &'static str,
    pub expected_signature: &'static str,
    /// Link hash of the record stored as a genesis record.
    pub expected_genesis_link: &'static str,
}

/// Link hash of the second vector stored with the first vector's genesis
/// link as its `prev_hash`. Both sign the same document.
pub const CHAINED_LINK: &str = "47e3e785d6626c5ed23e16449767fbb472a01165e27dafc29d15e437b2e59e96";

/// All signing vectors.
pub fn signing_vectors() -> Vec<SigningVector> {
    vec![
        SigningVector {
            name: "genesis with checksum",
            seed: [0x42; 32],
            doc_id: "handbook-2025",
            user_sub: "user-alice",
            user_email: "alice@example.com",
            user_name: "Alice",
            signed_at: 1_736_870_400_000,
            nonce: [0x11; 32],
            doc_checksum: Some("b3b4e8714358cc79990c5c83391172e01c3e79a1b456d7e0c570cbf59da30e23"),
            expected_public_key: "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12",
            expected_payload_hash: "d7b33c886a1e60a79c85c93efe6e9f49f4a0e19ecca134e3f7f8a777788984f0",
            expected_signature: "87e73b056005f3c329eff6f581a062c696131a92f82bf77bbdb8e536c62757c0\
                                 a4a4a969b75b1ffac1a3eae1d8706d1f4150bf890d8f38c7f329e7157392220f",
            expected_genesis_link: "de162e0de9c66a7e2208b064f364f630b47b2244c3f0a3ca417e978778f80fa1",
        },
        SigningVector {
            name: "no checksum bound",
            seed: [0x42; 32],
            doc_id: "handbook-2025",
            user_sub: "user-bob",
            user_email: "bob@example.com",
            user_name: "Bob",
            signed_at: 1_736_870_401_000,
            nonce: [0x22; 32],
            doc_checksum: None,
            expected_public_key: "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12",
            expected_payload_hash: "199cce8b359f994bae3f8d3bfe4264999d2850912d9155e426e8a879367c88bc",
            expected_signature: "f0ee4c6fe41e5f02a21c39e31090bf08c95c5e6cc7371e48f52388a8f57b9cde\
                                 28306c0461e945d0404d577e5636c37785da53e12c308dbc9f8a32a35ab4200f",
            expected_genesis_link: "0ae9e36eccb5d80c2af25adfd37a97a27f87553c8dc0dd776845a048e27e14f8",
        },
        SigningVector {
            name: "zero seed, epoch, empty checksum",
            seed: [0x00; 32],
            doc_id: "d",
            user_sub: "s",
            user_email: "a@b",
            user_name: "",
            signed_at: 0,
            nonce: [0x00; 32],
            doc_checksum: Some(""),
            expected_public_key: "3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29",
            expected_payload_hash: "9c9f914a803d92d04ea1eebe2754df0c11660fe9da06f1bbd3eb68ebfd27d0ec",
            expected_signature: "aa13b97dc6ff6355c376c48faffa5ea0e24f45c8a483ae43f4d9ddd2ac3ae2f8\
                                 b79e5ae93b9f53482028a4acc2165425cd0349016844ef54ba13722c313b4c06",
            expected_genesis_link: "0e966a01abb904d008dd8759a84552c55a9219e84c3efaaf75dba568e720bbec",
        },
    ]
}

impl SigningVector {
    pub fn user(&self) -> UserIdentity {
        UserIdentity::new(self.user_sub, self.user_email, self.user_name)
    }

    pub fn signer(&self) -> Ed25519Signer {
        Ed25519Signer::new(Keypair::from_seed(&self.seed))
    }
}

/// Sign a vector and store it with the given `prev_hash`.
pub fn record_from_vector(vector: &SigningVector, prev_hash: Option<Sha256Hash>) -> Signature {
    let user = vector.user();
    let nonce = Nonce::from_bytes(vector.nonce);
    let signed = vector
        .signer()
        .sign(vector.doc_id, &user, vector.signed_at, &nonce, vector.doc_checksum)
        .expect("vector inputs encode");

    NewSignature {
        doc_id: vector.doc_id.to_string(),
        user,
        signed_at: vector.signed_at,
        doc_checksum: vector.doc_checksum.map(str::to_string),
        payload_hash: signed.payload_hash,
        signature: signed.signature,
        nonce,
        referer: None,
        prev_hash,
        hash_version: HASH_VERSION,
    }
    .into_stored(SignatureId(1), vector.signed_at)
}

/// Check every signing vector, reporting `(name, matches, payload hash)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    signing_vectors()
        .iter()
        .map(|v| {
            let record = record_from_vector(v, None);
            let payload_hash = record.payload_hash.to_hex();
            let matches = payload_hash == v.expected_payload_hash
                && record.signature.to_hex() == v.expected_signature
                && v.signer().public_key().to_hex() == v.expected_public_key
                && record
                    .link_hash()
                    .is_ok_and(|h| h.to_hex() == v.expected_genesis_link);

            (v.name.to_string(), matches, payload_hash)
        })
        .collect()
}

/// Export the signing vectors as JSON for other implementations.
pub fn signing_vectors_json() -> serde_json::Value {
    let vectors: Vec<_> = signing_vectors()
        .iter()
        .map(|v| {
            serde_json::json!({
                "name": v.name,
                "seed": hex::encode(v.seed),
                "doc_id": v.doc_id,
                "user": { "sub": v.user_sub, "email": v.user_email, "name": v.user_name },
                "signed_at": v.signed_at,
                "nonce": hex::encode(v.nonce),
                "doc_checksum": v.doc_checksum,
                "public_key": v.expected_public_key,
                "payload_hash": v.expected_payload_hash,
                "signature": v.expected_signature,
                "genesis_link": v.expected_genesis_link,
            })
        })
        .collect();

    serde_json::json!({ "signing": vectors, "chained_link": CHAINED_LINK })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ackchain_core::verify_signature;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, payload_hash) in verify_all_vectors() {
            assert!(matches, "vector '{}' drifted (payload hash {})", name, payload_hash);
        }
    }

    #[test]
    fn test_vectors_verify() {
        for vector in signing_vectors() {
            let record = record_from_vector(&vector, None);
            verify_signature(&record, &vector.signer().public_key())
                .unwrap_or_else(|e| panic!("vector '{}' does not verify: {}", vector.name, e));
        }
    }

    #[test]
    fn test_chained_link() {
        let vectors = signing_vectors();
        let genesis = record_from_vector(&vectors[0], None);
        let second = record_from_vector(&vectors[1], Some(genesis.link_hash().unwrap()));

        assert_eq!(second.link_hash().unwrap().to_hex(), CHAINED_LINK);
        assert_ne!(second.link_hash().unwrap().to_hex(), vectors[1].expected_genesis_link);
    }

    #[test]
    fn test_sha256_vectors() {
        for vector in checksum_vectors() {
            if vector.algorithm == ChecksumAlgorithm::Sha256 {
                assert_eq!(
                    Sha256Hash::hash(vector.body).to_hex(),
                    vector.expected_hex,
                    "vector '{}'",
                    vector.name
                );
            }
        }
    }

    #[test]
    fn test_json_export() {
        let json = signing_vectors_json();
        assert_eq!(json["signing"].as_array().unwrap().len(), signing_vectors().len());
        assert_eq!(json["signing"][1]["doc_checksum"], serde_json::Value::Null);
        assert_eq!(json["chained_link"], CHAINED_LINK);
    }
}
