//! Wrapping a pod password to an identity using ECDH + AES Key Wrap
//!
//! A pod's password cannot protect the record that announces it, so the
//! password is persisted wrapped to the *root* identity's public key:
//!
//! 1. **Generate ephemeral keypair**: Create a temporary Ed25519 keypair
//! 2. **Perform ECDH**: Convert keys to X25519 and compute shared secret
//! 3. **Wrap key**: Use AES-KW to encrypt the password with the shared secret
//! 4. **Package**: `ephemeral_pubkey || wrapped_password`
//!
//! Recovery repeats the ECDH with the recipient's private key and unwraps.

use std::convert::TryFrom;
use std::fmt;

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::secret::{Secret, SecretError, SECRET_SIZE};

/// Size of AES Key Wrap integrity block in bytes
pub const KW_NONCE_SIZE: usize = 8;
/// Total size of a share in bytes
///
/// Layout: ephemeral_pubkey (32) || wrapped_secret (40) = 72 bytes
pub const SECRET_SHARE_SIZE: usize = PUBLIC_KEY_SIZE + SECRET_SIZE + KW_NONCE_SIZE;

/// Errors that can occur during share creation or recovery
#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    #[error("share error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// A secret wrapped so that only one identity can recover it.
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_secret: 40 bytes ]
/// ```
///
/// Serialized as lowercase hex in JSON.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct SecretShare([u8; SECRET_SHARE_SIZE]);

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretShare({})", self.to_hex())
    }
}

impl Serialize for SecretShare {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SecretShare {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        SecretShare::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&[u8]> for SecretShare {
    type Error = SecretShareError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != SECRET_SHARE_SIZE {
            return Err(anyhow::anyhow!(
                "invalid share size, expected {}, got {}",
                SECRET_SHARE_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut share = [0u8; SECRET_SHARE_SIZE];
        share.copy_from_slice(bytes);
        Ok(SecretShare(share))
    }
}

impl SecretShare {
    /// Parse a share from a hexadecimal string
    pub fn from_hex(hex: &str) -> Result<Self, SecretShareError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; SECRET_SHARE_SIZE];
        hex::decode_to_slice(hex, &mut buff).map_err(|_| anyhow::anyhow!("hex decode error"))?;
        Ok(SecretShare(buff))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Wrap `secret` for `recipient`.
    pub fn new(secret: &Secret, recipient: &PublicKey) -> Result<Self, SecretShareError> {
        let ephemeral_private = SecretKey::generate()?;
        let ephemeral_public = ephemeral_private.public();

        let ephemeral_x25519_private = ephemeral_private.to_x25519();
        let recipient_x25519_public = recipient.to_x25519()?;
        let shared_secret = ephemeral_x25519_private.diffie_hellman(&recipient_x25519_public);

        let kek = Kek::from(*shared_secret.as_bytes());
        let wrapped = kek
            .wrap_vec(secret.bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        let ephemeral_bytes = ephemeral_public.to_bytes();
        if ephemeral_bytes.len() + wrapped.len() != SECRET_SHARE_SIZE {
            return Err(anyhow::anyhow!("expected share size is incorrect").into());
        };

        let mut share = [0u8; SECRET_SHARE_SIZE];
        share[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral_bytes);
        share[PUBLIC_KEY_SIZE..].copy_from_slice(&wrapped);

        Ok(SecretShare(share))
    }

    /// Recover the wrapped secret using the recipient's private key
    ///
    /// Fails if the share was created for a different recipient or was
    /// tampered with.
    pub fn recover(&self, recipient_secret: &SecretKey) -> Result<Secret, SecretShareError> {
        let ephemeral_public = PublicKey::try_from(&self.0[..PUBLIC_KEY_SIZE])?;

        let recipient_x25519_private = recipient_secret.to_x25519();
        let ephemeral_x25519_public = ephemeral_public.to_x25519()?;
        let shared_secret = recipient_x25519_private.diffie_hellman(&ephemeral_x25519_public);

        let kek = Kek::from(*shared_secret.as_bytes());
        let unwrapped = kek
            .unwrap_vec(&self.0[PUBLIC_KEY_SIZE..])
            .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?;

        Ok(Secret::from_slice(&unwrapped)?)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_share_secret() {
        let secret = Secret::from_slice(&[42u8; SECRET_SIZE]).unwrap();
        let private_key = SecretKey::generate().unwrap();
        let share = SecretShare::new(&secret, &private_key.public()).unwrap();
        assert_eq!(share.recover(&private_key).unwrap(), secret);
    }

    #[test]
    fn test_share_different_keys() {
        let secret = Secret::generate().unwrap();
        let alice = SecretKey::generate().unwrap();
        let bob = SecretKey::generate().unwrap();

        let share = SecretShare::new(&secret, &alice.public()).unwrap();
        assert_eq!(share.recover(&alice).unwrap(), secret);
        assert!(share.recover(&bob).is_err());
    }

    #[test]
    fn test_share_json_is_hex() {
        let secret = Secret::generate().unwrap();
        let private_key = SecretKey::generate().unwrap();
        let share = SecretShare::new(&secret, &private_key.public()).unwrap();

        let json = serde_json::to_string(&share).unwrap();
        assert_eq!(json, format!("\"{}\"", share.to_hex()));

        let recovered_share: SecretShare = serde_json::from_str(&json).unwrap();
        assert_eq!(share, recovered_share);
        assert_eq!(recovered_share.recover(&private_key).unwrap(), secret);
    }

    #[test]
    fn test_share_invalid_length() {
        assert!(SecretShare::try_from([0u8; SECRET_SHARE_SIZE - 1].as_slice()).is_err());
        assert!(SecretShare::from_hex(&hex::encode([0u8; SECRET_SHARE_SIZE + 1])).is_err());
    }
}
