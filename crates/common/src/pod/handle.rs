use crate::context::Context;
use crate::crypto::{Address, PodPassword, SecretError, SecretKey};
use crate::error::FsError;
use crate::feed::{LookupAnswer, Topic};

use super::directory::DirectoryMetadata;
use super::file::FileMetadata;
use super::path::clean_path;

/// Written as the next version of a deleted item's topic
const TOMBSTONE: &[u8] = b"podfs:tombstone:v1";

/// Who a pod's feeds belong to
#[derive(Debug, Clone)]
pub enum Owner {
    /// One of our pods: we hold its derived signing identity
    Owned(SecretKey),
    /// Someone else's pod, imported from a share. Read-only.
    Shared(Address),
}

/// A metadata record read back from a pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Directory(DirectoryMetadata),
    File(FileMetadata),
}

impl Record {
    fn parse(data: &[u8]) -> Result<Self, FsError> {
        let value: serde_json::Value = serde_json::from_slice(data)?;
        if value.get("meta").is_some() {
            Ok(Record::Directory(DirectoryMetadata::from_json(data)?))
        } else {
            Ok(Record::File(FileMetadata::from_json(data)?))
        }
    }
}

/// An open pod: a namespace with its own feed owner and password.
///
/// Every path inside the pod is the topic of its own version chain, so a
/// directory and a file can never share a name.
#[derive(Debug, Clone)]
pub struct Pod {
    ctx: Context,
    name: String,
    owner: Owner,
    password: PodPassword,
}

impl Pod {
    pub(crate) fn new(ctx: Context, name: &str, owner: Owner, password: PodPassword) -> Self {
        Self {
            ctx,
            name: name.to_string(),
            owner,
            password,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The feed owner address of this pod
    pub fn address(&self) -> Address {
        match &self.owner {
            Owner::Owned(key) => key.address(),
            Owner::Shared(address) => *address,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.owner, Owner::Shared(_))
    }

    pub(crate) fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub(crate) fn password(&self) -> &PodPassword {
        &self.password
    }

    /// The signing identity, if this pod may be written to
    pub(crate) fn signer(&self) -> Result<&SecretKey, FsError> {
        match &self.owner {
            Owner::Owned(key) => Ok(key),
            Owner::Shared(_) => Err(FsError::Unauthorized(format!(
                "pod {} is shared with us read-only",
                self.name
            ))),
        }
    }

    pub(crate) fn now_secs(&self) -> i64 {
        self.ctx.clock().now_secs()
    }

    /// Latest version of `path`, tombstones included
    pub(crate) async fn lookup(&self, path: &str) -> Result<Option<LookupAnswer>, FsError> {
        let at = self.ctx.clock().now_millis();
        Ok(self
            .ctx
            .feed()
            .try_lookup(&Topic::new(path), &self.address(), at)
            .await?)
    }

    /// Decrypt a version. `None` if it is a tombstone.
    fn open_version(&self, answer: &LookupAnswer) -> Result<Option<Vec<u8>>, FsError> {
        let plaintext = self.password.decrypt(&answer.data)?;
        if plaintext == TOMBSTONE {
            return Ok(None);
        }
        Ok(Some(plaintext))
    }

    pub(crate) async fn read_record(
        &self,
        path: &str,
    ) -> Result<Option<(Record, LookupAnswer)>, FsError> {
        let answer = match self.lookup(path).await? {
            Some(answer) => answer,
            None => return Ok(None),
        };
        match self.open_version(&answer)? {
            Some(plaintext) => Ok(Some((Record::parse(&plaintext)?, answer))),
            None => Ok(None),
        }
    }

    /// Directory record at `path`. `None` if absent, deleted, or a file.
    pub(crate) async fn read_dir_meta(
        &self,
        path: &str,
    ) -> Result<Option<(DirectoryMetadata, LookupAnswer)>, FsError> {
        match self.read_record(path).await? {
            Some((Record::Directory(dir), answer)) => Ok(Some((dir, answer))),
            _ => Ok(None),
        }
    }

    /// Encrypt `plaintext` and write it as the version after `previous`
    pub(crate) async fn write_after(
        &self,
        path: &str,
        previous: Option<&LookupAnswer>,
        plaintext: &[u8],
    ) -> Result<(), FsError> {
        let signer = self.signer()?;
        let data = self.password.encrypt(plaintext)?;
        let at = self.ctx.clock().now_millis();
        self.ctx
            .feed()
            .write_next(&Topic::new(path), signer, previous, &data, at)
            .await?;
        Ok(())
    }

    /// Write `plaintext` as the next version of `path`
    pub(crate) async fn write(&self, path: &str, plaintext: &[u8]) -> Result<(), FsError> {
        self.signer()?;
        let previous = self.lookup(path).await?;
        self.write_after(path, previous.as_ref(), plaintext).await
    }

    /// Mark `path` deleted. Earlier versions stay in the store.
    pub(crate) async fn write_tombstone(&self, path: &str) -> Result<(), FsError> {
        self.write(path, TOMBSTONE).await
    }

    /// Probe the topic of an already clean path.
    ///
    /// A version we cannot decrypt still counts: someone wrote there.
    pub(crate) async fn exists_at(&self, path: &str) -> Result<bool, FsError> {
        let answer = match self.lookup(path).await? {
            Some(answer) => answer,
            None => return Ok(false),
        };
        match self.open_version(&answer) {
            Ok(version) => Ok(version.is_some()),
            Err(FsError::Secret(SecretError::Decrypt(_))) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Whether a live file or directory exists at `path`
    pub async fn exists(&self, path: &str) -> Result<bool, FsError> {
        let path = clean_path(path)?;
        self.exists_at(&path).await
    }
}
