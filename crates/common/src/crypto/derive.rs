//! Per-pod signing identities
//!
//! Every owned pod writes its feeds under its own identity, derived from the
//! root identity and the pod's index. The derivation is a pure function of
//! `(root, index)`, so any session holding the root key reaches the same pod
//! feeds without shared state. Index 0 is the root identity itself.

use super::keys::{SecretKey, PRIVATE_KEY_SIZE};

/// BLAKE3 context string for child key derivation.
const POD_IDENTITY_CONTEXT: &str = "podfs 2024-06-01 pod identity derivation v1";

/// Derives child signing identities from a root identity.
pub trait KeyDerivation: Send + Sync + std::fmt::Debug {
    /// Derive the identity for `index`. Index 0 must return `root` unchanged.
    fn derive(&self, root: &SecretKey, index: u32) -> SecretKey;
}

/// Hierarchical derivation using BLAKE3's key derivation mode over
/// `root_private_key || index_be`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3KeyDerivation;

impl KeyDerivation for Blake3KeyDerivation {
    fn derive(&self, root: &SecretKey, index: u32) -> SecretKey {
        if index == 0 {
            return root.clone();
        }
        let mut material = [0u8; PRIVATE_KEY_SIZE + 4];
        material[..PRIVATE_KEY_SIZE].copy_from_slice(&root.to_bytes());
        material[PRIVATE_KEY_SIZE..].copy_from_slice(&index.to_be_bytes());
        SecretKey::from(blake3::derive_key(POD_IDENTITY_CONTEXT, &material))
    }
}
