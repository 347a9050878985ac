use crate::crypto::{SecretError, SecretShareError};
use crate::feed::FeedError;
use crate::store::ChunkStoreError;

/// Errors surfaced by pod, directory, file and share operations
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// A name or path failed validation. Raised before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("parent directory not found: {0}")]
    ParentNotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("too many pods, the limit is {0}")]
    TooManyPods(usize),
    /// Passed through from the chunk store unchanged
    #[error("store error: {0}")]
    Store(#[from] ChunkStoreError),
    #[error("feed error: {0}")]
    Feed(FeedError),
    #[error("decryption error: {0}")]
    Secret(#[from] SecretError),
    #[error("share error: {0}")]
    Share(#[from] SecretShareError),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<FeedError> for FsError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::Store(e) => FsError::Store(e),
            e => FsError::Feed(e),
        }
    }
}

impl FsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FsError::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        FsError::NotFound(what.into())
    }

    pub(crate) fn already_exists(what: impl Into<String>) -> Self {
        FsError::AlreadyExists(what.into())
    }
}
