//! Single-owner chunks
//!
//! A single-owner chunk is addressed by `blake3(identifier || owner_address)`
//! rather than by its content, which is what lets a feed place successive
//! versions at predictable addresses. The owner signs
//! `identifier || blake3(payload)`; readers verify the signature and that the
//! signer is the owner they expected.
//!
//! Wire format:
//!
//! ```text
//! [ identifier: 32 ][ owner public key: 32 ][ signature: 64 ][ payload ... ]
//! ```

use crate::crypto::{Address, PublicKey, SecretKey, Signature, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};

use super::reference::{Reference, REFERENCE_SIZE};

/// Size of a single-owner chunk identifier in bytes
pub const IDENTIFIER_SIZE: usize = 32;
/// Size of the envelope preceding the payload
pub const SOC_HEADER_SIZE: usize = IDENTIFIER_SIZE + PUBLIC_KEY_SIZE + SIGNATURE_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum SocError {
    #[error("single-owner chunk too short: {0} bytes")]
    TooShort(usize),
    #[error("single-owner chunk has an invalid owner key")]
    InvalidOwner,
    #[error("single-owner chunk signature does not verify")]
    InvalidSignature,
}

/// Compute the store address of the chunk written by `owner` under `identifier`.
pub fn soc_address(identifier: &[u8; IDENTIFIER_SIZE], owner: &Address) -> Reference {
    let mut hasher = blake3::Hasher::new();
    hasher.update(identifier);
    hasher.update(owner.as_bytes());
    Reference::from_bytes(*hasher.finalize().as_bytes())
}

fn signing_digest(
    identifier: &[u8; IDENTIFIER_SIZE],
    payload: &[u8],
) -> [u8; IDENTIFIER_SIZE + REFERENCE_SIZE] {
    let mut digest = [0u8; IDENTIFIER_SIZE + REFERENCE_SIZE];
    digest[..IDENTIFIER_SIZE].copy_from_slice(identifier);
    digest[IDENTIFIER_SIZE..].copy_from_slice(blake3::hash(payload).as_bytes());
    digest
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleOwnerChunk {
    identifier: [u8; IDENTIFIER_SIZE],
    owner: PublicKey,
    signature: Signature,
    payload: Vec<u8>,
}

impl SingleOwnerChunk {
    /// Sign `payload` under `identifier` with the owner's key.
    pub fn new(identifier: [u8; IDENTIFIER_SIZE], payload: Vec<u8>, owner: &SecretKey) -> Self {
        let signature = owner.sign(&signing_digest(&identifier, &payload));
        Self {
            identifier,
            owner: owner.public(),
            signature,
            payload,
        }
    }

    pub fn identifier(&self) -> &[u8; IDENTIFIER_SIZE] {
        &self.identifier
    }

    pub fn owner(&self) -> Address {
        self.owner.address()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn address(&self) -> Reference {
        soc_address(&self.identifier, &self.owner())
    }

    pub fn verify(&self) -> Result<(), SocError> {
        self.owner
            .verify(&signing_digest(&self.identifier, &self.payload), &self.signature)
            .map_err(|_| SocError::InvalidSignature)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SOC_HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&self.identifier);
        out.extend_from_slice(&self.owner.to_bytes());
        out.extend_from_slice(&self.signature.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse and verify a chunk.
    pub fn decode(data: &[u8]) -> Result<Self, SocError> {
        if data.len() < SOC_HEADER_SIZE {
            return Err(SocError::TooShort(data.len()));
        }
        let mut identifier = [0u8; IDENTIFIER_SIZE];
        identifier.copy_from_slice(&data[..IDENTIFIER_SIZE]);

        let owner = PublicKey::try_from(&data[IDENTIFIER_SIZE..IDENTIFIER_SIZE + PUBLIC_KEY_SIZE])
            .map_err(|_| SocError::InvalidOwner)?;

        let mut signature = [0u8; SIGNATURE_SIZE];
        signature.copy_from_slice(&data[IDENTIFIER_SIZE + PUBLIC_KEY_SIZE..SOC_HEADER_SIZE]);

        let chunk = Self {
            identifier,
            owner,
            signature: Signature::from_bytes(&signature),
            payload: data[SOC_HEADER_SIZE..].to_vec(),
        };
        chunk.verify()?;
        Ok(chunk)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode_decode_verifies() {
        let owner = SecretKey::generate().unwrap();
        let chunk = SingleOwnerChunk::new([7u8; IDENTIFIER_SIZE], b"payload".to_vec(), &owner);

        let decoded = SingleOwnerChunk::decode(&chunk.encode()).unwrap();
        assert_eq!(decoded, chunk);
        assert_eq!(decoded.owner(), owner.address());
        assert_eq!(decoded.address(), soc_address(&[7u8; IDENTIFIER_SIZE], &owner.address()));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let owner = SecretKey::generate().unwrap();
        let chunk = SingleOwnerChunk::new([1u8; IDENTIFIER_SIZE], b"payload".to_vec(), &owner);
        let mut bytes = chunk.encode();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert!(matches!(
            SingleOwnerChunk::decode(&bytes),
            Err(SocError::InvalidSignature)
        ));
    }

    #[test]
    fn test_short_chunk_rejected() {
        assert!(matches!(
            SingleOwnerChunk::decode(&[0u8; 10]),
            Err(SocError::TooShort(10))
        ));
    }

    #[test]
    fn test_address_depends_on_owner() {
        let a = SecretKey::generate().unwrap();
        let b = SecretKey::generate().unwrap();
        let id = [3u8; IDENTIFIER_SIZE];
        assert_ne!(soc_address(&id, &a.address()), soc_address(&id, &b.address()));
    }
}
