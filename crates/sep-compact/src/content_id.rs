//! Content identifier parsing.
//!
//! Accepts the encodings used by the storage network:
//! - `Qm...` → CIDv0 (base58btc, dag-pb, sha2-256)
//! - `bafy...` / `bafk...` → CIDv1 (any multibase prefix)
//! - binary CID bytes (`ContentId::from_bytes`)
//!
//! Parsing never fetches data.

use std::fmt;
use std::str::FromStr;

use cid::multihash::Multihash;
use cid::{Cid, Version};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Multicodec code for raw binary blocks.
pub const RAW_CODEC: u64 = 0x55;

/// Multicodec code for dag-pb blocks (all CIDv0).
pub const DAG_PB_CODEC: u64 = 0x70;

/// Multihash code for sha2-256.
pub const SHA2_256_CODE: u64 = 0x12;

/// Error parsing a content identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content identifier '{input}': {reason}")]
pub struct CidError {
    /// The rejected input (lossy for binary input).
    pub input: String,

    /// Why it was rejected.
    pub reason: String,
}

impl CidError {
    fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// An immutable content address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId(Cid);

impl ContentId {
    /// Parse a textual content identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use sep_compact::ContentId;
    ///
    /// let v0 = ContentId::parse("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap();
    /// assert_eq!(v0.version(), 0);
    ///
    /// assert!(ContentId::parse("not-a-cid").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, CidError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(CidError::new(input, "empty identifier"));
        }

        if trimmed.len() != input.len() {
            return Err(CidError::new(input, "surrounding whitespace"));
        }

        Cid::try_from(trimmed)
            .map(Self)
            .map_err(|e| CidError::new(input, e.to_string()))
    }

    /// Parse a binary content identifier.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CidError> {
        Cid::try_from(bytes)
            .map(Self)
            .map_err(|e| CidError::new(String::from_utf8_lossy(bytes), e.to_string()))
    }

    /// Content identifier of `bytes` as a raw block (CIDv1, sha2-256).
    pub fn for_raw_block(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let hash = Multihash::<64>::wrap(SHA2_256_CODE, digest.as_slice())
            .expect("32-byte digest must fit a 64-byte multihash");
        Self(Cid::new_v1(RAW_CODEC, hash))
    }

    /// CID version (0 or 1).
    pub fn version(&self) -> u64 {
        match self.0.version() {
            Version::V0 => 0,
            Version::V1 => 1,
        }
    }

    /// Multicodec of the addressed block.
    pub fn codec(&self) -> u64 {
        self.0.codec()
    }

    /// Multihash code of the address.
    pub fn hash_code(&self) -> u64 {
        self.0.hash().code()
    }

    /// Hash digest carried by the address.
    pub fn digest(&self) -> &[u8] {
        self.0.hash().digest()
    }

    /// Binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }

    /// Underlying `cid::Cid`.
    pub fn as_cid(&self) -> &Cid {
        &self.0
    }
}

impl From<Cid> for ContentId {
    fn from(cid: Cid) -> Self {
        Self(cid)
    }
}

impl FromStr for ContentId {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&[u8]> for ContentId {
    type Error = CidError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
