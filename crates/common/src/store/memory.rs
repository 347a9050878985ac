use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::reference::{BatchId, Reference};
use super::soc::SingleOwnerChunk;
use super::{ChunkStore, ChunkStoreError};

/// In-memory chunk store backed by a HashMap
#[derive(Debug, Clone, Default)]
pub struct MemoryChunkStore {
    inner: Arc<RwLock<MemoryChunkStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryChunkStoreInner {
    chunks: HashMap<Reference, Bytes>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks held
    pub fn len(&self) -> usize {
        self.inner.read().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, address: &Reference) -> bool {
        self.inner.read().chunks.contains_key(address)
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn get_chunk(&self, address: &Reference) -> Result<Bytes, ChunkStoreError> {
        self.inner
            .read()
            .chunks
            .get(address)
            .cloned()
            .ok_or(ChunkStoreError::NotFound(*address))
    }

    async fn put_chunk(&self, data: Bytes, _batch: &BatchId) -> Result<Reference, ChunkStoreError> {
        let address = Reference::of_content(&data);
        self.inner.write().chunks.entry(address).or_insert(data);
        Ok(address)
    }

    async fn put_single_owner_chunk(
        &self,
        chunk: &SingleOwnerChunk,
        _batch: &BatchId,
    ) -> Result<Reference, ChunkStoreError> {
        chunk.verify()?;
        let address = chunk.address();
        let mut inner = self.inner.write();
        if inner.chunks.contains_key(&address) {
            return Err(ChunkStoreError::ChunkExists(address));
        }
        inner.chunks.insert(address, Bytes::from(chunk.encode()));
        Ok(address)
    }
}
