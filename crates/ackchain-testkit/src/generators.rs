//! Proptest generators for property-based testing.

use proptest::prelude::*;

use ackchain_core::{
    ChecksumAlgorithm, CryptoSigner, Ed25519Signer, Keypair, NewSignature, Nonce, Signature,
    SignatureId, UserIdentity, HASH_VERSION,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

pub fn nonce() -> impl Strategy<Value = Nonce> {
    any::<[u8; 32]>().prop_map(Nonce::from_bytes)
}

/// Generate a valid user identity, including non-ASCII names.
pub fn user_identity() -> impl Strategy<Value = UserIdentity> {
    (
        "[a-zA-Z0-9|-]{1,40}",
        "[a-z0-9.]{1,20}@[a-z]{1,10}\\.[a-z]{2,4}",
        "\\PC{0,40}",
    )
        .prop_map(|(sub, email, name)| UserIdentity::new(sub, email, name))
}

pub fn doc_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(String::from)
}

/// Generate a reasonable timestamp in Unix milliseconds.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000
}

pub fn algorithm() -> impl Strategy<Value = ChecksumAlgorithm> {
    prop_oneof![
        Just(ChecksumAlgorithm::Sha256),
        Just(ChecksumAlgorithm::Sha512),
        Just(ChecksumAlgorithm::Md5),
    ]
}

/// Generate a well-formed lowercase hex digest for `algorithm`.
pub fn checksum_hex(algorithm: ChecksumAlgorithm) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), algorithm.hex_len() / 2).prop_map(hex::encode)
}

/// Parameters for generating a signed record.
#[derive(Debug, Clone)]
pub struct SigningParams {
    pub seed: [u8; 32],
    pub doc_id: String,
    pub user: UserIdentity,
    pub signed_at: i64,
    pub nonce: Nonce,
    pub doc_checksum: Option<String>,
}

impl Arbitrary for SigningParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            doc_id(),
            user_identity(),
            timestamp(),
            nonce(),
            prop::option::of(checksum_hex(ChecksumAlgorithm::Sha256)),
        )
            .prop_map(|(seed, doc_id, user, signed_at, nonce, doc_checksum)| SigningParams {
                seed,
                doc_id,
                user,
                signed_at,
                nonce,
                doc_checksum,
            })
            .boxed()
    }
}

impl SigningParams {
    pub fn signer(&self) -> Ed25519Signer {
        Ed25519Signer::new(Keypair::from_seed(&self.seed))
    }
}

/// Sign the parameters and store the result as a genesis record.
pub fn record_from_params(params: &SigningParams) -> Signature {
    let signed = params
        .signer()
        .sign(
            &params.doc_id,
            &params.user,
            params.signed_at,
            &params.nonce,
            params.doc_checksum.as_deref(),
        )
        .expect("generated inputs encode");

    NewSignature {
        doc_id: params.doc_id.clone(),
        user: params.user.clone(),
        signed_at: params.signed_at,
        doc_checksum: params.doc_checksum.clone(),
        payload_hash: signed.payload_hash,
        signature: signed.signature,
        nonce: params.nonce,
        referer: None,
        prev_hash: None,
        hash_version: HASH_VERSION,
    }
    .into_stored(SignatureId(1), params.signed_at)
}
