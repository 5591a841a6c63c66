//! Canonical CBOR encoding for signed payloads and chain links.
//!
//! This module implements the subset of RFC 8949 Core Deterministic Encoding
//! the records need:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! Both encodings are FROZEN. Changing a key or a field breaks every stored
//! signature (signing message) or every stored `prev_hash` (link message).

use ciborium::value::Value;

use crate::error::CoreError;
use crate::signature::Signature;
use crate::types::{Nonce, UserIdentity};

/// Domain separation prefix for the signed message.
pub const SIGN_DOMAIN: &[u8] = b"ackchain/signature/v1";

/// Domain separation prefix for chain link hashes.
pub const LINK_DOMAIN: &[u8] = b"ackchain/link/v1";

/// Signed payload keys (integer keys for compact encoding).
mod sign_keys {
    pub const DOC_ID: u64 = 0;
    pub const USER_SUB: u64 = 1;
    pub const USER_EMAIL: u64 = 2;
    pub const USER_NAME: u64 = 3;
    pub const SIGNED_AT: u64 = 4;
    pub const NONCE: u64 = 5;
    pub const DOC_CHECKSUM: u64 = 6;
}

/// Link hash keys.
mod link_keys {
    pub const DOC_ID: u64 = 0;
    pub const USER_SUB: u64 = 1;
    pub const USER_EMAIL: u64 = 2;
    pub const SIGNED_AT: u64 = 3;
    pub const PAYLOAD_HASH: u64 = 4;
    pub const SIGNATURE: u64 = 5;
    pub const NONCE: u64 = 6;
    pub const PREV_HASH: u64 = 7;
}

/// Build the message a signer signs: `SIGN_DOMAIN || canonical payload`.
pub fn signing_message(
    doc_id: &str,
    user: &UserIdentity,
    signed_at: i64,
    nonce: &Nonce,
    doc_checksum: Option<&str>,
) -> Result<Vec<u8>, CoreError> {
    let checksum = match doc_checksum {
        Some(c) => Value::Text(c.to_string()),
        None => Value::Null,
    };

    let payload = Value::Map(vec![
        (key(sign_keys::DOC_ID), Value::Text(doc_id.to_string())),
        (key(sign_keys::USER_SUB), Value::Text(user.sub.clone())),
        (key(sign_keys::USER_EMAIL), Value::Text(user.email.clone())),
        (key(sign_keys::USER_NAME), Value::Text(user.name.clone())),
        (key(sign_keys::SIGNED_AT), Value::Integer(signed_at.into())),
        (key(sign_keys::NONCE), Value::Bytes(nonce.0.to_vec())),
        (key(sign_keys::DOC_CHECKSUM), checksum),
    ]);

    let mut message = SIGN_DOMAIN.to_vec();
    encode_value_to(&mut message, &payload)?;
    Ok(message)
}

/// Build the message hashed into a chain link: `LINK_DOMAIN || canonical fields`.
///
/// Only fields that are stable after creation take part, so the link hash
/// changes if and only if one of them is altered in storage.
pub fn link_message(signature: &Signature) -> Result<Vec<u8>, CoreError> {
    let prev = match &signature.prev_hash {
        Some(h) => Value::Bytes(h.0.to_vec()),
        None => Value::Null,
    };

    let fields = Value::Map(vec![
        (key(link_keys::DOC_ID), Value::Text(signature.doc_id.clone())),
        (key(link_keys::USER_SUB), Value::Text(signature.user.sub.clone())),
        (key(link_keys::USER_EMAIL), Value::Text(signature.user.email.clone())),
        (key(link_keys::SIGNED_AT), Value::Integer(signature.signed_at.into())),
        (key(link_keys::PAYLOAD_HASH), Value::Bytes(signature.payload_hash.0.to_vec())),
        (key(link_keys::SIGNATURE), Value::Bytes(signature.signature.0.to_vec())),
        (key(link_keys::NONCE), Value::Bytes(signature.nonce.0.to_vec())),
        (key(link_keys::PREV_HASH), prev),
    ]);

    let mut message = LINK_DOMAIN.to_vec();
    encode_value_to(&mut message, &fields)?;
    Ok(message)
}

fn key(k: u64) -> Value {
    Value::Integer(k.into())
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => return Err(CoreError::EncodingError("unsupported CBOR value type".into())),
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5), keys sorted by encoded bytes.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}
