//! Golden vectors for cross-implementation verification.
//!
//! Every implementation must produce identical:
//! - payload hash (SHA-256 of the domain-separated signing message)
//! - signature (deterministic Ed25519)
//! - link hash of a genesis record and of a linked successor
//! - checksum digests of served bodies

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use ackchain::core::{signing_message, verify_chain, CryptoSigner, Nonce, SIGN_DOMAIN};
use ackchain::fetch::{ChecksumComputer, FetchOptions, HttpChecksumComputer};
use ackchain_testkit::{
    checksum_vectors, local_fetch_options, record_from_vector, signing_vectors, CHAINED_LINK,
};

#[test]
fn test_signing_vectors() {
    for v in signing_vectors() {
        let record = record_from_vector(&v, None);

        assert_eq!(
            v.signer().public_key().to_hex(),
            v.expected_public_key,
            "{}: public key",
            v.name
        );
        assert_eq!(record.payload_hash.to_hex(), v.expected_payload_hash, "{}: payload hash", v.name);
        assert_eq!(record.signature.to_hex(), v.expected_signature, "{}: signature", v.name);
        assert_eq!(
            record.link_hash().unwrap().to_hex(),
            v.expected_genesis_link,
            "{}: genesis link",
            v.name
        );
    }
}

#[test]
fn test_signing_message_layout() {
    let v = &signing_vectors()[2];
    let message = signing_message(
        v.doc_id,
        &v.user(),
        v.signed_at,
        &Nonce::from_bytes(v.nonce),
        v.doc_checksum,
    )
    .unwrap();

    let mut expected = SIGN_DOMAIN.to_vec();
    // map(7), keys 0..=6 in order
    expected.extend_from_slice(&[0xa7, 0x00, 0x61, b'd', 0x01, 0x61, b's']);
    expected.extend_from_slice(&[0x02, 0x63, b'a', b'@', b'b', 0x03, 0x60, 0x04, 0x00]);
    expected.extend_from_slice(&[0x05, 0x58, 0x20]);
    expected.extend_from_slice(&[0u8; 32]);
    expected.extend_from_slice(&[0x06, 0x60]);

    assert_eq!(message, expected);
}

#[test]
fn test_chained_vector() {
    let vectors = signing_vectors();
    let genesis = record_from_vector(&vectors[0], None);
    let second = record_from_vector(&vectors[1], Some(genesis.link_hash().unwrap()));

    assert_eq!(second.link_hash().unwrap().to_hex(), CHAINED_LINK);
    assert!(verify_chain(&[genesis, second]).unwrap().is_valid);
}

#[tokio::test]
async fn test_checksum_vectors_over_http() {
    let computer = HttpChecksumComputer::new();

    for v in checksum_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(v.body, "application/pdf"))
            .mount(&server)
            .await;

        let options = FetchOptions {
            algorithm: v.algorithm,
            ..local_fetch_options()
        };
        let computed = computer
            .compute(&format!("{}/doc.pdf", server.uri()), &options)
            .await
            .unwrap_or_else(|| panic!("{}: fetch was inconclusive", v.name));

        assert_eq!(computed.digest_hex, v.expected_hex, "{}", v.name);
        assert_eq!(computed.algorithm, v.algorithm);
    }
}
