//! Share capsules.
//!
//! A capsule bundles a directory or file record with the pod password and
//! owner address needed to read what it describes. It is encrypted with a
//! fresh key and stored as a content chunk; the returned reference carries
//! that key, so anyone holding the reference can open the capsule and
//! nobody else can.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::crypto::{Address, PodPassword, Secret};
use crate::error::FsError;
use crate::store::{
    ChunkStoreError, EncryptedReference, Reference, Store, ENCRYPTED_REFERENCE_SIZE,
    REFERENCE_SIZE,
};

use super::directory::{DirectoryMetadata, Entry, RawDirectoryMetadata};
use super::file::{FileMetadata, RawFileMetadata};
use super::handle::Pod;
use super::path::{clean_path, join, validate_name, validate_pod_name};
use super::pod_list::SharedPod;
use super::pods::Pods;

/// What a share reference resolves to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShareCapsule {
    #[serde(rename_all = "camelCase")]
    Directory {
        pod_name: String,
        address: Address,
        password: PodPassword,
        meta: RawDirectoryMetadata,
    },
    #[serde(rename_all = "camelCase")]
    File {
        pod_name: String,
        address: Address,
        password: PodPassword,
        meta: RawFileMetadata,
    },
}

impl ShareCapsule {
    pub fn pod_name(&self) -> &str {
        match self {
            ShareCapsule::Directory { pod_name, .. } | ShareCapsule::File { pod_name, .. } => {
                pod_name
            }
        }
    }

    /// Owner address of the shared pod
    pub fn address(&self) -> Address {
        match self {
            ShareCapsule::Directory { address, .. } | ShareCapsule::File { address, .. } => {
                *address
            }
        }
    }

    pub fn password(&self) -> &PodPassword {
        match self {
            ShareCapsule::Directory { password, .. } | ShareCapsule::File { password, .. } => {
                password
            }
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, ShareCapsule::Directory { .. })
    }

    pub fn directory(&self) -> Option<DirectoryMetadata> {
        match self {
            ShareCapsule::Directory { meta, .. } => Some(meta.clone().into()),
            ShareCapsule::File { .. } => None,
        }
    }

    pub fn file(&self) -> Result<Option<FileMetadata>, FsError> {
        match self {
            ShareCapsule::File { meta, .. } => Ok(Some(meta.clone().try_into()?)),
            ShareCapsule::Directory { .. } => Ok(None),
        }
    }
}

async fn publish_capsule(
    store: &Store,
    capsule: &ShareCapsule,
) -> Result<EncryptedReference, FsError> {
    let key = Secret::generate()?;
    let data = key.encrypt(&serde_json::to_vec(capsule)?)?;
    let address = store.put(Bytes::from(data)).await?;
    tracing::debug!("share::publish_capsule: capsule stored at {}", address);
    Ok(EncryptedReference::new(address, key))
}

async fn fetch_chunk(
    store: &Store,
    address: &Reference,
    reference: &str,
) -> Result<Bytes, FsError> {
    match store.get(address).await {
        Ok(data) => Ok(data),
        Err(ChunkStoreError::NotFound(_)) => {
            Err(FsError::not_found(format!("share {}", reference)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve a share reference. Malformed references and capsules are
/// reported as `NotFound`.
async fn fetch_capsule(store: &Store, reference: &str) -> Result<ShareCapsule, FsError> {
    let not_found = || FsError::not_found(format!("share {}", reference));

    let plaintext = match reference.len() {
        n if n == ENCRYPTED_REFERENCE_SIZE * 2 => {
            let encrypted = EncryptedReference::from_hex(reference).map_err(|_| not_found())?;
            let data = fetch_chunk(store, encrypted.address(), reference).await?;
            encrypted.key().decrypt(&data).map_err(|_| not_found())?
        }
        n if n == REFERENCE_SIZE * 2 => {
            let address = Reference::from_hex(reference).map_err(|_| not_found())?;
            fetch_chunk(store, &address, reference).await?.to_vec()
        }
        _ => return Err(not_found()),
    };

    serde_json::from_slice(&plaintext).map_err(|e| {
        tracing::debug!("share::fetch_capsule: {} is not a capsule: {}", reference, e);
        not_found()
    })
}

impl Pod {
    /// Publish a capsule for the directory at `path`
    pub async fn share_dir(&self, path: &str) -> Result<EncryptedReference, FsError> {
        let dir = self.stat_dir(path).await?;
        let capsule = ShareCapsule::Directory {
            pod_name: self.name().to_string(),
            address: self.address(),
            password: self.password().clone(),
            meta: RawDirectoryMetadata::from(&dir),
        };
        let reference = publish_capsule(self.ctx().store(), &capsule).await?;
        tracing::info!("Pod::share_dir: shared {} of pod {}", dir.full_path(), self.name());
        Ok(reference)
    }

    /// Publish a capsule for the file at `path`
    pub async fn share_file(&self, path: &str) -> Result<EncryptedReference, FsError> {
        let file = self.stat(path).await?;
        // an imported file is shared with the key its blocks are under
        let password = file
            .content_key
            .clone()
            .unwrap_or_else(|| self.password().clone());
        let capsule = ShareCapsule::File {
            pod_name: self.name().to_string(),
            address: self.address(),
            password,
            meta: RawFileMetadata::from(&file),
        };
        let reference = publish_capsule(self.ctx().store(), &capsule).await?;
        tracing::info!("Pod::share_file: shared {} of pod {}", file.full_path(), self.name());
        Ok(reference)
    }

    /// Import a shared file into the directory `parent`, optionally renamed.
    ///
    /// Only the record is copied; the new record points at the sharer's
    /// manifest and blocks.
    pub async fn save_shared_file(
        &self,
        reference: &str,
        parent: &str,
        rename: Option<&str>,
    ) -> Result<FileMetadata, FsError> {
        self.signer()?;
        let parent = clean_path(parent)?;
        if let Some(name) = rename {
            validate_name(name, self.ctx().config().max_name_length)?;
        }

        let capsule = fetch_capsule(self.ctx().store(), reference).await?;
        let mut file = capsule
            .file()?
            .ok_or_else(|| FsError::invalid("share reference points at a directory"))?;

        if let Some(name) = rename {
            file.name = name.to_string();
        }
        validate_name(&file.name, self.ctx().config().max_name_length)?;
        file.path = parent.clone();
        file.content_key = if capsule.password() == self.password() {
            None
        } else {
            Some(capsule.password().clone())
        };

        let path = join(&parent, &file.name);
        self.add_entry(&parent, Entry::file(file.name.as_str()))
            .await?;
        self.write(&path, &file.to_json()?).await?;
        tracing::info!(
            "Pod::save_shared_file: imported {} from pod {} into {}",
            file.name,
            capsule.pod_name(),
            path
        );
        Ok(file)
    }
}

impl Pods {
    /// Resolve a share reference without importing anything
    pub async fn shared_info(&self, reference: &str) -> Result<ShareCapsule, FsError> {
        fetch_capsule(self.context().store(), reference).await
    }

    /// Import a shared directory as a read-only pod named `rename`, or
    /// after the sharer's pod if no name is given
    pub async fn save_shared_pod(
        &self,
        reference: &str,
        rename: Option<&str>,
    ) -> Result<SharedPod, FsError> {
        let capsule = self.shared_info(reference).await?;
        if !capsule.is_dir() {
            return Err(FsError::invalid("share reference points at a file"));
        }

        let name = rename.unwrap_or(capsule.pod_name()).to_string();
        validate_pod_name(&name, self.context().config().max_pod_name_length)?;
        let shared = SharedPod {
            name,
            address: capsule.address(),
            password: capsule.password().clone(),
        };
        self.add_shared(shared.clone()).await?;
        Ok(shared)
    }
}
