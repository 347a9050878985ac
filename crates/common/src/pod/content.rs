//! Parent listing maintenance.
//!
//! Adding a child rewrites the parent's record with the new entry before the
//! child's own record is written; removing one rewrites the parent without
//! it. The two writes are not atomic. A reader that finds a listed child
//! with no record skips it (see [`Pod::read_dir`]).

use crate::crypto::SecretError;
use crate::error::FsError;

use super::directory::{DirectoryMetadata, Entry, EntryKind};
use super::handle::{Pod, Record};
use super::path::join;

impl Pod {
    /// List `entry` under `parent`.
    ///
    /// Fails with `ParentNotFound` if `parent` is not a directory, and with
    /// `AlreadyExists` if the name is listed or if its topic already holds
    /// a live record that claims it (a concurrent writer may have written
    /// it without listing it yet).
    pub(crate) async fn add_entry(&self, parent: &str, entry: Entry) -> Result<(), FsError> {
        self.signer()?;
        let (mut dir, previous) = self
            .read_dir_meta(parent)
            .await?
            .ok_or_else(|| FsError::ParentNotFound(parent.to_string()))?;

        let child = join(parent, &entry.name);
        if dir.get(&entry.name).is_some() || self.claims_name(&child, &dir).await? {
            return Err(FsError::already_exists(child));
        }

        dir.add(entry);
        dir.modification_time = self.now_secs();
        self.write_after(parent, Some(&previous), &dir.to_json()?)
            .await?;
        tracing::debug!("Pod::add_entry: listed {} in {}", child, parent);
        Ok(())
    }

    /// Whether the unlisted record at `child` still claims its name.
    ///
    /// A record created before `parent` was is left over from an earlier
    /// directory at the same path and may be written over. A version that
    /// does not open as a record always claims the name.
    async fn claims_name(
        &self,
        child: &str,
        parent: &DirectoryMetadata,
    ) -> Result<bool, FsError> {
        let created = match self.read_record(child).await {
            Ok(None) => return Ok(false),
            Ok(Some((Record::Directory(dir), _))) => dir.creation_time,
            Ok(Some((Record::File(file), _))) => file.creation_time,
            Err(FsError::Secret(SecretError::Decrypt(_))) | Err(FsError::Codec(_)) => {
                return Ok(true)
            }
            Err(e) => return Err(e),
        };
        if created < parent.creation_time {
            tracing::debug!(
                "Pod::add_entry: {} predates {}, reusing the name",
                child,
                parent.full_path()
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Unlist the child `name` of kind `kind` from `parent`
    pub(crate) async fn remove_entry(
        &self,
        parent: &str,
        name: &str,
        kind: EntryKind,
    ) -> Result<(), FsError> {
        self.signer()?;
        let child = join(parent, name);
        let (mut dir, previous) = self
            .read_dir_meta(parent)
            .await?
            .ok_or_else(|| FsError::not_found(child.clone()))?;

        if dir.remove(name, kind).is_none() {
            return Err(FsError::not_found(child));
        }

        dir.modification_time = self.now_secs();
        self.write_after(parent, Some(&previous), &dir.to_json()?)
            .await?;
        tracing::debug!("Pod::remove_entry: unlisted {} from {}", child, parent);
        Ok(())
    }
}
