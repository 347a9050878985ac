//! Cryptographic primitives for PodFS
//!
//! - **Identity**: Ed25519 keypairs; the owner [`Address`] of a feed is
//!   derived from the public key
//! - **Encryption**: ChaCha20-Poly1305 under a 32-byte [`PodPassword`]
//! - **Key derivation**: one child identity per pod index ([`KeyDerivation`])
//! - **Password wrapping**: ECDH (X25519) + AES-KW so a pod password can be
//!   persisted for the root identity ([`SecretShare`])
//!
//! # Security Model
//!
//! Each pod gets its own identity and its own password. Feeds written by one
//! pod are signed by that pod's identity and encrypted with its password, so
//! pods share a store without sharing a keyspace. The pod list lives under
//! the root identity and is encrypted with a key derived from the root's
//! private key.

mod derive;
mod keys;
mod secret;
mod secret_share;

pub use derive::{Blake3KeyDerivation, KeyDerivation};
pub use ed25519_dalek::Signature;
pub use keys::{
    Address, KeyError, PublicKey, SecretKey, ADDRESS_SIZE, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE,
    SIGNATURE_SIZE,
};
pub use secret::{PodPassword, Secret, SecretError, SECRET_SIZE};
pub use secret_share::{SecretShare, SecretShareError, SECRET_SHARE_SIZE};
