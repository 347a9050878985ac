/**
 * Time sources for feed epochs and
 *  metadata timestamps.
 */
pub mod clock;
/**
 * Runtime options, loadable from TOML,
 *  and root key persistence.
 */
pub mod config;
/**
 * The explicit handle every operation
 *  is given: store, options, clock and
 *  key derivation.
 */
pub mod context;
/**
 * Cryptographic types and operations.
 *  - Identities, signatures and addresses
 *  - Pod password encryption
 *  - Per-pod key derivation
 *  - Key-to-key secret sharing
 */
pub mod crypto;
pub mod error;
/**
 * Epoch-based versioned feeds over
 *  single-owner chunks.
 */
pub mod feed;
/**
 * Pods, directories, files and the
 *  sharing protocol.
 */
pub mod pod;
/**
 * The chunk store collaborator and
 *  its memory and filesystem backends.
 */
pub mod store;

pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::Config;
    pub use crate::context::Context;
    pub use crate::crypto::{Address, PodPassword, PublicKey, Secret, SecretKey};
    pub use crate::error::FsError;
    pub use crate::feed::{Epoch, Feed, LookupAnswer, Topic};
    pub use crate::pod::{DirItem, DirectoryMetadata, FileMetadata, Pod, PodList, Pods};
    pub use crate::store::{ChunkStore, EncryptedReference, Reference, Store};
}
