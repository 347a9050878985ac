use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt, TryStreamExt};

use crate::crypto::Secret;
use crate::error::FsError;

use super::directory::{Entry, EntryKind};
use super::file::{Block, BlocksManifest, FileMetadata};
use super::handle::{Pod, Record};
use super::path::{clean_path, split, validate_name};

impl Pod {
    /// Upload `data` to `path` using the configured block size
    pub async fn upload(
        &self,
        path: &str,
        data: impl Into<Bytes>,
    ) -> Result<FileMetadata, FsError> {
        let block_size = self.ctx().config().block_size;
        self.upload_with_block_size(path, data, block_size).await
    }

    /// Upload `data` to `path`, split into `block_size` blocks.
    ///
    /// Blocks are encrypted and uploaded concurrently; the manifest lists
    /// them in byte order. The parent must exist and the name must be free.
    pub async fn upload_with_block_size(
        &self,
        path: &str,
        data: impl Into<Bytes>,
        block_size: usize,
    ) -> Result<FileMetadata, FsError> {
        self.signer()?;
        if block_size == 0 || block_size > u32::MAX as usize {
            return Err(FsError::invalid(format!("invalid block size {}", block_size)));
        }
        let path = clean_path(path)?;
        let (parent, name) =
            split(&path).ok_or_else(|| FsError::invalid("cannot upload to the root"))?;
        validate_name(name, self.ctx().config().max_name_length)?;

        // Skip the content upload when the listing already rules it out
        match self.read_dir_meta(parent).await? {
            None => return Err(FsError::ParentNotFound(parent.to_string())),
            Some((dir, _)) if dir.get(name).is_some() => {
                return Err(FsError::already_exists(path));
            }
            Some(_) => {}
        }

        let data: Bytes = data.into();
        let blocks = self
            .upload_blocks(&data, block_size, self.password())
            .await?;
        let manifest = BlocksManifest { blocks };
        let encrypted = self
            .password()
            .encrypt(&serde_json::to_vec(&manifest)?)?;
        let manifest_reference = self.ctx().store().put(Bytes::from(encrypted)).await?;

        let now = self.now_secs();
        let meta = FileMetadata {
            path: parent.to_string(),
            name: name.to_string(),
            size: data.len() as u64,
            block_size: block_size as u32,
            content_type: mime_guess::from_path(name)
                .first_or_octet_stream()
                .to_string(),
            compression: String::new(),
            creation_time: now,
            access_time: now,
            modification_time: now,
            manifest: manifest_reference,
            content_key: None,
        };

        self.add_entry(parent, Entry::file(name)).await?;
        self.write(&path, &meta.to_json()?).await?;
        tracing::info!(
            "Pod::upload: wrote {} ({} bytes, {} blocks) to pod {}",
            path,
            meta.size,
            manifest.blocks.len(),
            self.name()
        );
        Ok(meta)
    }

    async fn upload_blocks(
        &self,
        data: &Bytes,
        block_size: usize,
        key: &Secret,
    ) -> Result<Vec<Block>, FsError> {
        let store = self.ctx().store();
        let concurrency = self.ctx().config().upload_concurrency.max(1);
        let chunks = (0..data.len())
            .step_by(block_size)
            .map(|start| data.slice(start..(start + block_size).min(data.len())))
            .enumerate()
            .collect::<Vec<_>>();

        stream::iter(chunks.into_iter().map(|(i, chunk)| async move {
            let encrypted = key.encrypt(&chunk)?;
            let reference = store.put(Bytes::from(encrypted)).await?;
            Ok::<_, FsError>(Block {
                name: Some(format!("block-{:05}", i)),
                size: chunk.len() as u32,
                compressed_size: chunk.len() as u32,
                reference,
            })
        }))
        .buffered(concurrency)
        .try_collect()
        .await
    }

    /// The file record at `path`
    pub async fn stat(&self, path: &str) -> Result<FileMetadata, FsError> {
        let path = clean_path(path)?;
        match self.read_record(&path).await? {
            Some((Record::File(meta), _)) => Ok(meta),
            _ => Err(FsError::not_found(path)),
        }
    }

    /// Fetch and reassemble the file at `path`
    pub async fn download(&self, path: &str) -> Result<Bytes, FsError> {
        let meta = self.stat(path).await?;
        if !meta.compression.is_empty() {
            return Err(FsError::Unsupported(format!(
                "compression {:?}",
                meta.compression
            )));
        }

        let key = meta.content_key.as_ref().unwrap_or(self.password());
        let store = self.ctx().store();
        let encrypted = store.get(&meta.manifest).await?;
        let manifest: BlocksManifest = serde_json::from_slice(&key.decrypt(&encrypted)?)?;

        let total = manifest.total_size();
        if total != meta.size {
            tracing::warn!(
                "Pod::download: {} records {} bytes but its blocks hold {}",
                meta.full_path(),
                meta.size,
                total
            );
        }

        let concurrency = self.ctx().config().upload_concurrency.max(1);
        let blocks: Vec<Vec<u8>> = stream::iter(manifest.blocks.iter().map(|block| async move {
            let encrypted = store.get(&block.reference).await?;
            Ok::<_, FsError>(key.decrypt(&encrypted)?)
        }))
        .buffered(concurrency)
        .try_collect()
        .await?;

        let mut out = BytesMut::with_capacity(total as usize);
        for block in blocks {
            out.extend_from_slice(&block);
        }
        Ok(out.freeze())
    }

    /// Remove the file at `path` from its directory.
    ///
    /// The manifest and blocks stay in the store.
    pub async fn rm(&self, path: &str) -> Result<(), FsError> {
        self.signer()?;
        let path = clean_path(path)?;
        let (parent, name) =
            split(&path).ok_or_else(|| FsError::invalid("cannot remove the root directory"))?;

        self.remove_entry(parent, name, EntryKind::File).await?;
        self.write_tombstone(&path).await?;
        tracing::info!("Pod::rm: removed {} from pod {}", path, self.name());
        Ok(())
    }
}
