use std::fmt;

use crate::crypto::Address;
use crate::store::{soc_address, Reference, IDENTIFIER_SIZE};

use super::epoch::Epoch;

/// Hash of the logical name a resource's versions are filed under
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic([u8; 32]);

impl Topic {
    pub fn new(name: &str) -> Self {
        Self(*blake3::hash(name.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Single-owner chunk identifier of this topic's version at `epoch`
    pub fn identifier(&self, epoch: &Epoch) -> [u8; IDENTIFIER_SIZE] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.0);
        hasher.update(&epoch.base().to_be_bytes());
        hasher.update(&[epoch.level()]);
        *hasher.finalize().as_bytes()
    }

    /// Store address of `owner`'s version of this topic at `epoch`
    pub fn address(&self, epoch: &Epoch, owner: &Address) -> Reference {
        soc_address(&self.identifier(epoch), owner)
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", hex::encode(&self.0[..8]))
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SecretKey;

    #[test]
    fn test_identifiers_are_distinct() {
        let topic = Topic::new("/docs");
        let a = topic.identifier(&Epoch::new(3, 8));
        let b = topic.identifier(&Epoch::new(2, 8));
        let c = topic.identifier(&Epoch::new(3, 16));
        let d = Topic::new("/docs/").identifier(&Epoch::new(3, 8));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a, Topic::from("/docs").identifier(&Epoch::new(3, 8)));
    }

    #[test]
    fn test_address_is_owner_keyed() {
        let topic = Topic::new("/");
        let epoch = Epoch::first(1_000);
        let alice = SecretKey::generate().unwrap().address();
        let bob = SecretKey::generate().unwrap().address();
        assert_ne!(topic.address(&epoch, &alice), topic.address(&epoch, &bob));
    }
}
