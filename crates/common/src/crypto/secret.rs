//! Pod password and payload encryption using ChaCha20-Poly1305
//!
//! Every metadata record and every file block inside a pod is encrypted with
//! the pod's 32-byte password before it leaves the process. The same type is
//! used for the key protecting the root pod list (derived from the root
//! identity) and for the one-off keys protecting share capsules.

use std::fmt;
use std::ops::Deref;

use chacha20poly1305::Key;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of a pod password / symmetric key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of BLAKE3 hash in bytes (256 bits)
pub const BLAKE3_HASH_SIZE: usize = 32;
/// Size of the Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("decryption failed: {0}")]
    Decrypt(&'static str),
    #[error("invalid secret size, expected {SECRET_SIZE}, got {0}")]
    InvalidLength(usize),
}

/// A 256-bit symmetric key.
///
/// The encrypted format is:
/// `nonce (12 bytes) || encrypted(hash(32 bytes) || plaintext) || tag (16 bytes)`.
/// The BLAKE3 hash of the plaintext is prepended before encryption so that a
/// successfully authenticated payload is also checked for content integrity.
///
/// # Examples
///
/// ```ignore
/// let password = Secret::generate()?;
/// let ciphertext = password.encrypt(b"directory metadata")?;
/// assert_eq!(password.decrypt(&ciphertext)?, b"directory metadata");
/// ```
#[derive(PartialEq, Eq, Clone)]
pub struct Secret([u8; SECRET_SIZE]);

/// The symmetric key protecting everything inside one pod.
pub type PodPassword = Secret;

// Never print key material.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Secret::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff)
            .map_err(|e| anyhow::anyhow!("failed to generate random bytes: {}", e))?;
        Ok(Self(buff))
    }

    /// Derive a secret from key material under a fixed context string.
    ///
    /// Used to turn the root identity's private key into the key that
    /// protects the pod list.
    pub fn derive(context: &str, material: &[u8]) -> Self {
        Self(blake3::derive_key(context, material))
    }

    /// Create a secret from a byte slice
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(SecretError::InvalidLength(data.len()));
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Parse a secret from hex, with or without a "0x" prefix.
    pub fn from_hex(hex: &str) -> Result<Self, SecretError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes =
            hex::decode(hex).map_err(|_| anyhow::anyhow!("secret hex decode error"))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt data using ChaCha20-Poly1305 AEAD with a random nonce.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        let plaintext_hash = blake3::hash(data);

        let mut data_with_hash = Vec::with_capacity(BLAKE3_HASH_SIZE + data.len());
        data_with_hash.extend_from_slice(plaintext_hash.as_bytes());
        data_with_hash.extend_from_slice(data);

        let key = Key::from_slice(self.bytes());
        let cipher = ChaCha20Poly1305::new(key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data_with_hash.as_ref())
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(out)
    }

    /// Decrypt data produced by [`Secret::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Decrypt`] if:
    /// - Data is too short to contain a nonce and tag
    /// - Authentication fails (tampered data or wrong password)
    /// - The embedded plaintext hash does not match
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(SecretError::Decrypt("data too short for nonce"));
        }

        let key = Key::from_slice(self.bytes());
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = ChaCha20Poly1305::new(key);
        let decrypted = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| SecretError::Decrypt("authentication failed"))?;

        if decrypted.len() < BLAKE3_HASH_SIZE {
            return Err(SecretError::Decrypt("decrypted data too short for hash header"));
        }

        let stored_hash = &decrypted[..BLAKE3_HASH_SIZE];
        let plaintext = &decrypted[BLAKE3_HASH_SIZE..];

        let computed_hash = blake3::hash(plaintext);
        if stored_hash != computed_hash.as_bytes() {
            return Err(SecretError::Decrypt("hash verification failed"));
        }

        Ok(plaintext.to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secret_encrypt_decrypt() {
        let secret = Secret::generate().unwrap();
        let data = b"hello world, this is a test message for encryption";

        let encrypted = secret.encrypt(data).unwrap();
        let decrypted = secret.decrypt(&encrypted).unwrap();

        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_wrong_password_fails() {
        let secret = Secret::generate().unwrap();
        let other = Secret::generate().unwrap();
        let encrypted = secret.encrypt(b"pod metadata").unwrap();

        assert!(matches!(
            other.decrypt(&encrypted),
            Err(SecretError::Decrypt(_))
        ));
    }

    #[test]
    fn test_secret_size_validation() {
        assert!(matches!(
            Secret::from_slice(&[1u8; 16]),
            Err(SecretError::InvalidLength(16))
        ));
        assert!(Secret::from_slice(&[1u8; 64]).is_err());
        assert!(Secret::from_slice(&[1u8; SECRET_SIZE]).is_ok());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let secret = Secret::generate().unwrap();
        let mut encrypted = secret.encrypt(b"test data for integrity check").unwrap();
        encrypted[NONCE_SIZE + 10] ^= 0xFF;
        assert!(secret.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let secret = Secret::generate().unwrap();
        assert!(secret.decrypt(&[0u8; NONCE_SIZE]).is_err());
    }

    #[test]
    fn test_empty_data_encryption() {
        let secret = Secret::generate().unwrap();
        let encrypted = secret.encrypt(b"").unwrap();
        assert!(secret.decrypt(&encrypted).unwrap().is_empty());
    }

    #[test]
    fn test_hex_and_json() {
        let secret = Secret::generate().unwrap();
        let hex = secret.to_hex();
        assert_eq!(hex.len(), 2 * SECRET_SIZE);
        assert_eq!(Secret::from_hex(&hex).unwrap(), secret);
        assert_eq!(Secret::from_hex(&format!("0x{hex}")).unwrap(), secret);

        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, format!("\"{hex}\""));
        let back: Secret = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Secret::derive("podfs test context", b"material");
        let b = Secret::derive("podfs test context", b"material");
        let c = Secret::derive("podfs other context", b"material");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
