//! Content hashing using SHA3-512.
//!
//! Provides the digest used for Merkle leaves, interior nodes and UTIDs.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_512};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};

/// Length of a SHA3-512 digest in bytes.
pub const DIGEST_LEN: usize = 64;

/// A SHA3-512 digest (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha3Digest([u8; DIGEST_LEN]);

impl Sha3Digest {
    /// Hash arbitrary data.
    #[must_use]
    pub fn hash(data: &[u8]) -> Self {
        Self::hash_multi(&[data])
    }

    /// Hash multiple data chunks (concatenated).
    #[must_use]
    pub fn hash_multi(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha3_512::new();
        for part in parts {
            hasher.update(part);
        }
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Create from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Try to create from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidDigestLength`] if the slice is not
    /// exactly 64 bytes.
    pub fn try_from_slice(slice: &[u8]) -> CryptoResult<Self> {
        if slice.len() != DIGEST_LEN {
            return Err(CryptoError::InvalidDigestLength {
                expected: DIGEST_LEN,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Encode as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not 64 bytes.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHexEncoding)?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Debug for Sha3Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha3Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Sha3Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Sha3Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha3Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<[u8]> for Sha3Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
