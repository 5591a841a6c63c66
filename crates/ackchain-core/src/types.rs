//! Strong type definitions for ackchain.
//!
//! Identifiers and random values are newtypes so they cannot be swapped
//! for one another by accident.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Store-assigned identifier of a persisted signature.
///
/// Identifiers grow with insertion order, so sorting by id yields the order
/// in which signatures were appended.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureId(pub i64);

impl SignatureId {
    /// Get the raw value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureId({})", self.0)
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SignatureId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Accessors, conversions and hex serde for a `[u8; N]` newtype.
macro_rules! byte_newtype {
    ($ty:ident, $len:expr) => {
        impl $ty {
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(s, &mut bytes)?;
                Ok(Self(bytes))
            }
        }

        impl AsRef<[u8]> for $ty {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl TryFrom<&[u8]> for $ty {
            type Error = std::array::TryFromSliceError;

            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                slice.try_into().map(Self)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use byte_newtype;

/// A 32-byte single-use random value bound into every signed payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce(pub [u8; 32]);

byte_newtype!(Nonce, 32);

impl Nonce {
    /// Draw a fresh nonce from the operating system's CSPRNG.
    pub fn generate() -> Result<Self, CoreError> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CoreError::NonceGeneration(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({}...)", &self.to_hex()[..8])
    }
}

/// The authenticated user acknowledging a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable subject identifier from the identity provider.
    pub sub: String,
    pub email: String,
    pub name: String,
}

impl UserIdentity {
    pub fn new(sub: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: email.into(),
            name: name.into(),
        }
    }

    /// A usable identity has a non-blank subject and a plausible email.
    pub fn is_valid(&self) -> bool {
        !self.sub.trim().is_empty() && self.email.contains('@')
    }
}

/// Document metadata as seen through the document lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    /// Where the document content can be fetched from.
    pub url: Option<String>,
    /// Baseline checksum recorded when the document was registered.
    pub checksum: Option<String>,
    /// Algorithm of `checksum`; `None` means SHA-256.
    pub checksum_algorithm: Option<String>,
}

impl Document {
    /// The reference checksum, ignoring blank values.
    pub fn reference_checksum(&self) -> Option<&str> {
        self.checksum.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Algorithm name of the reference checksum.
    pub fn algorithm_name(&self) -> &str {
        self.checksum_algorithm
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("SHA-256")
    }
}
