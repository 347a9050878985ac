use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{Secret, SECRET_SIZE};

/// Size of a plain chunk reference in bytes
pub const REFERENCE_SIZE: usize = 32;
/// Size of an encrypted reference (address || key) in bytes
pub const ENCRYPTED_REFERENCE_SIZE: usize = REFERENCE_SIZE + SECRET_SIZE;
/// Size of a postage batch identifier in bytes
pub const BATCH_ID_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("invalid reference hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid reference length: expected {expected} hex characters, got {got}")]
    Length { expected: usize, got: usize },
}

fn decode_fixed<const N: usize>(hex: &str) -> Result<[u8; N], ReferenceError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() != 2 * N {
        return Err(ReferenceError::Length {
            expected: 2 * N,
            got: hex.len(),
        });
    }
    let mut buff = [0u8; N];
    hex::decode_to_slice(hex, &mut buff)?;
    Ok(buff)
}

/// A 32-byte chunk address in the store, rendered as 64 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Reference([u8; REFERENCE_SIZE]);

impl Reference {
    pub fn from_bytes(bytes: [u8; REFERENCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Content address of `data`.
    pub fn of_content(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; REFERENCE_SIZE] {
        &self.0
    }

    pub fn from_hex(hex: &str) -> Result<Self, ReferenceError> {
        Ok(Self(decode_fixed(hex)?))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.to_hex())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Reference::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// A reference that carries the key needed to decrypt what it points at.
///
/// Rendered as 128 lowercase hex chars: `address || key`.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedReference {
    address: Reference,
    key: Secret,
}

impl EncryptedReference {
    pub fn new(address: Reference, key: Secret) -> Self {
        Self { address, key }
    }

    pub fn address(&self) -> &Reference {
        &self.address
    }

    pub fn key(&self) -> &Secret {
        &self.key
    }

    pub fn from_hex(hex: &str) -> Result<Self, ReferenceError> {
        let bytes: [u8; ENCRYPTED_REFERENCE_SIZE] = decode_fixed(hex)?;
        let mut address = [0u8; REFERENCE_SIZE];
        address.copy_from_slice(&bytes[..REFERENCE_SIZE]);
        let mut key = [0u8; SECRET_SIZE];
        key.copy_from_slice(&bytes[REFERENCE_SIZE..]);
        Ok(Self {
            address: Reference(address),
            key: Secret::from(key),
        })
    }

    pub fn to_hex(&self) -> String {
        format!("{}{}", self.address.to_hex(), self.key.to_hex())
    }
}

impl fmt::Debug for EncryptedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedReference({}, ..)", self.address.to_hex())
    }
}

impl fmt::Display for EncryptedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Postage batch that pays for uploads. Opaque to this crate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BatchId([u8; BATCH_ID_SIZE]);

impl BatchId {
    pub fn from_hex(hex: &str) -> Result<Self, ReferenceError> {
        Ok(Self(decode_fixed(hex)?))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BatchId({})", self.to_hex())
    }
}

impl Serialize for BatchId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BatchId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        BatchId::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
