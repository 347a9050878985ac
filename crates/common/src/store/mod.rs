//! The chunk store collaborator
//!
//! PodFS never talks to a network directly. Everything it persists goes
//! through a [`ChunkStore`]: immutable content-addressed chunks for file
//! blocks, manifests and share capsules, and signed [`SingleOwnerChunk`]s
//! for the versioned feeds that hold metadata.
//!
//! [`Store`] is the handle the rest of the crate holds. It pins the postage
//! batch used for uploads and bounds every round trip with a timeout.

mod fs;
mod memory;
mod reference;
mod soc;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub use fs::FsChunkStore;
pub use memory::MemoryChunkStore;
pub use reference::{
    BatchId, EncryptedReference, Reference, ReferenceError, BATCH_ID_SIZE,
    ENCRYPTED_REFERENCE_SIZE, REFERENCE_SIZE,
};
pub use soc::{soc_address, SingleOwnerChunk, SocError, IDENTIFIER_SIZE, SOC_HEADER_SIZE};

use crate::config::Config;

/// Default bound on a single store round trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ChunkStoreError {
    #[error("chunk not found: {0}")]
    NotFound(Reference),
    /// A single-owner chunk already lives at this address
    #[error("chunk already exists: {0}")]
    ChunkExists(Reference),
    #[error("invalid chunk: {0}")]
    InvalidChunk(#[from] SocError),
    /// The round trip did not complete in time. The write may still have
    ///  landed; callers must treat the outcome as unknown.
    #[error("store request timed out after {0:?}")]
    Timeout(Duration),
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store network error: {0}")]
    Network(String),
}

/// Raw access to a chunk store.
///
/// Implementations do not retry; retry policy, if any, belongs to the
///  implementation of the transport behind them.
#[async_trait]
pub trait ChunkStore: Send + Sync + Debug + 'static {
    /// Fetch the bytes stored at `address`
    ///
    /// Fails with [`ChunkStoreError::NotFound`] if nothing is stored there.
    async fn get_chunk(&self, address: &Reference) -> Result<Bytes, ChunkStoreError>;

    /// Store an immutable chunk and return its content address.
    ///  Storing identical content twice is not an error.
    async fn put_chunk(&self, data: Bytes, batch: &BatchId) -> Result<Reference, ChunkStoreError>;

    /// Store a signed single-owner chunk at `blake3(identifier || owner)`.
    ///
    /// Fails with [`ChunkStoreError::ChunkExists`] if the address is taken.
    async fn put_single_owner_chunk(
        &self,
        chunk: &SingleOwnerChunk,
        batch: &BatchId,
    ) -> Result<Reference, ChunkStoreError>;
}

/// Shared handle over a [`ChunkStore`] backend.
#[derive(Clone, Debug)]
pub struct Store {
    inner: Arc<dyn ChunkStore>,
    batch: BatchId,
    timeout: Duration,
}

impl Store {
    pub fn new(inner: Arc<dyn ChunkStore>, batch: BatchId, timeout: Duration) -> Self {
        Self {
            inner,
            batch,
            timeout,
        }
    }

    /// Wrap a backend using the batch and timeout from `config`
    pub fn with_config(inner: Arc<dyn ChunkStore>, config: &Config) -> Self {
        Self::new(inner, config.batch_id, config.request_timeout())
    }

    /// An ephemeral in-memory store
    pub fn memory() -> Self {
        Self::new(
            Arc::new(MemoryChunkStore::new()),
            BatchId::default(),
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    /// A store persisted under `path`
    pub async fn fs(path: &Path) -> Result<Self, ChunkStoreError> {
        tracing::debug!("Store::fs called with path: {:?}", path);
        let store = FsChunkStore::load(path).await?;
        Ok(Self::new(
            Arc::new(store),
            BatchId::default(),
            DEFAULT_REQUEST_TIMEOUT,
        ))
    }

    pub fn batch(&self) -> &BatchId {
        &self.batch
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, ChunkStoreError>>,
    ) -> Result<T, ChunkStoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ChunkStoreError::Timeout(self.timeout)),
        }
    }

    pub async fn get(&self, address: &Reference) -> Result<Bytes, ChunkStoreError> {
        tracing::debug!("Store::get: {}", address);
        self.bounded(self.inner.get_chunk(address)).await
    }

    /// Like [`Store::get`] but maps a missing chunk to `None`
    pub async fn try_get(&self, address: &Reference) -> Result<Option<Bytes>, ChunkStoreError> {
        match self.get(address).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(ChunkStoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn put(&self, data: Bytes) -> Result<Reference, ChunkStoreError> {
        let len = data.len();
        let reference = self.bounded(self.inner.put_chunk(data, &self.batch)).await?;
        tracing::debug!("Store::put: {} bytes at {}", len, reference);
        Ok(reference)
    }

    pub async fn put_soc(&self, chunk: &SingleOwnerChunk) -> Result<Reference, ChunkStoreError> {
        tracing::debug!("Store::put_soc: {}", chunk.address());
        self.bounded(self.inner.put_single_owner_chunk(chunk, &self.batch))
            .await
    }
}
