//! Pods, directories and files
//!
//! This module is the metadata tree of PodFS:
//!
//! - **[`Pods`]**: the pod list of one root identity; creates, deletes and
//!   opens pods and imports shared ones
//! - **[`Pod`]**: an open pod with directory and file operations
//! - **[`DirectoryMetadata`]** / **[`FileMetadata`]**: the records stored
//!   at every path
//! - **[`ShareCapsule`]**: what a share reference resolves to
//!
//! # Layout
//!
//! Every path in a pod is a feed topic under the pod's own identity. Each
//! version of that feed is the path's record, encrypted with the pod
//! password:
//!
//! ```text
//! root identity
//!   "podfs/pods"              -> pod list (key derived from the root)
//!   "podfs/pod-password/<i>"  -> pod i's password, wrapped to the root
//!
//! pod identity (derived from root, index i)
//!   "/"                       -> root directory record
//!   "/docs"                   -> directory record
//!   "/docs/a.txt"             -> file record -> manifest -> blocks
//! ```
//!
//! A directory lists its children by name; the children's records live on
//! their own topics. Changing anything appends a version to the affected
//! topics, and removing a child appends a tombstone to its topic. Nothing is
//! ever overwritten or erased.

mod content;
mod dir_ops;
mod directory;
mod file;
mod file_ops;
mod handle;
pub mod path;
mod pod_list;
mod pods;
mod share;

pub use dir_ops::DirItem;
pub use directory::{
    DirectoryMetadata, Entry, EntryKind, RawDirectoryMeta, RawDirectoryMetadata, DIR_TOKEN,
    FILE_TOKEN,
};
pub use file::{Block, BlocksManifest, FileMetadata, RawFileMetadata};
pub use handle::{Owner, Pod, Record};
pub use pod_list::{PodEntry, PodList, SharedPod};
pub use pods::{Pods, POD_LIST_TOPIC};
pub use share::ShareCapsule;
