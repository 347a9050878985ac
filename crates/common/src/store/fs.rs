use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::reference::{BatchId, Reference};
use super::soc::SingleOwnerChunk;
use super::{ChunkStore, ChunkStoreError};

/// Chunk store persisted in a local directory.
///
/// Chunks live at `<root>/<first two hex chars>/<remaining hex chars>`.
#[derive(Debug, Clone)]
pub struct FsChunkStore {
    path: PathBuf,
}

impl FsChunkStore {
    /// Open the store at `path`, creating the directory if needed
    pub async fn load(path: &Path) -> Result<Self, ChunkStoreError> {
        fs::create_dir_all(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn chunk_path(&self, address: &Reference) -> PathBuf {
        let hex = address.to_hex();
        self.path.join(&hex[0..2]).join(&hex[2..])
    }

    /// Whether the file at `path` holds an intact copy of `address`
    async fn holds(
        &self,
        path: &Path,
        address: &Reference,
        exclusive: bool,
    ) -> Result<bool, ChunkStoreError> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let intact = if exclusive {
            SingleOwnerChunk::decode(&data)
                .map(|chunk| chunk.address() == *address)
                .unwrap_or(false)
        } else {
            Reference::of_content(&data) == *address
        };
        if !intact {
            tracing::warn!("FsChunkStore: replacing damaged chunk file {:?}", path);
        }
        Ok(intact)
    }

    /// Write `data` at the chunk path of `address`.
    ///
    /// The data goes to a temporary file in the same folder and is moved
    /// into place once complete, so a chunk file is never seen half
    /// written. Returns whether anything was written.
    async fn write(
        &self,
        address: &Reference,
        data: &[u8],
        exclusive: bool,
    ) -> Result<bool, ChunkStoreError> {
        let path = self.chunk_path(address);
        if self.holds(&path, address, exclusive).await? {
            if exclusive {
                return Err(ChunkStoreError::ChunkExists(*address));
            }
            return Ok(false);
        }
        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder).await?;
        }

        let temp = temp_path(&path);
        let result = self.place(&temp, &path, address, data, exclusive).await;
        if let Err(e) = fs::remove_file(&temp).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("FsChunkStore: could not remove {:?}: {}", temp, e);
            }
        }
        result.map(|_| true)
    }

    async fn place(
        &self,
        temp: &Path,
        path: &Path,
        address: &Reference,
        data: &[u8],
        exclusive: bool,
    ) -> Result<(), ChunkStoreError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if !exclusive {
            fs::rename(temp, path).await?;
            return Ok(());
        }
        match fs::hard_link(temp, path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // another writer got there first, or a damaged file is in the way
                if self.holds(path, address, true).await? {
                    return Err(ChunkStoreError::ChunkExists(*address));
                }
                fs::rename(temp, path).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// A fresh sibling of `path` to stage a write in
fn temp_path(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}-{}.tmp", name, std::process::id(), n))
}

#[async_trait]
impl ChunkStore for FsChunkStore {
    async fn get_chunk(&self, address: &Reference) -> Result<Bytes, ChunkStoreError> {
        match fs::read(self.chunk_path(address)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ChunkStoreError::NotFound(*address))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put_chunk(
        &self,
        data: Bytes,
        _batch: &BatchId,
    ) -> Result<Reference, ChunkStoreError> {
        let address = Reference::of_content(&data);
        if self.write(&address, &data, false).await? {
            tracing::debug!("FsChunkStore::put_chunk: wrote {}", address);
        }
        Ok(address)
    }

    async fn put_single_owner_chunk(
        &self,
        chunk: &SingleOwnerChunk,
        _batch: &BatchId,
    ) -> Result<Reference, ChunkStoreError> {
        chunk.verify()?;
        let address = chunk.address();
        self.write(&address, &chunk.encode(), true).await?;
        Ok(address)
    }
}
