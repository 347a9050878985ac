use std::collections::{BTreeMap, VecDeque};

use crate::error::FsError;

use super::directory::{DirectoryMetadata, Entry, EntryKind};
use super::file::FileMetadata;
use super::handle::{Pod, Record};
use super::path::{clean_path, join, split, validate_name, ROOT};

/// A child found while reading a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirItem {
    Directory(DirectoryMetadata),
    File(FileMetadata),
}

impl DirItem {
    pub fn is_dir(&self) -> bool {
        matches!(self, DirItem::Directory(_))
    }

    pub fn name(&self) -> &str {
        match self {
            DirItem::Directory(dir) => &dir.name,
            DirItem::File(file) => &file.name,
        }
    }
}

impl Pod {
    /// Write a fresh, empty root directory record
    pub(crate) async fn init_root(&self) -> Result<(), FsError> {
        let root = DirectoryMetadata::root(self.now_secs());
        self.write(ROOT, &root.to_json()?).await?;
        tracing::debug!("Pod::init_root: created root of pod {}", self.name());
        Ok(())
    }

    /// Create the directory at `path`. Its parent must already exist.
    pub async fn mkdir(&self, path: &str) -> Result<DirectoryMetadata, FsError> {
        self.signer()?;
        let path = clean_path(path)?;
        let (parent, name) = split(&path).ok_or_else(|| FsError::already_exists(ROOT))?;
        validate_name(name, self.ctx().config().max_name_length)?;

        self.add_entry(parent, Entry::dir(name)).await?;

        let dir = DirectoryMetadata::new(parent, name, self.now_secs());
        self.write(&path, &dir.to_json()?).await?;
        tracing::info!("Pod::mkdir: created {} in pod {}", path, self.name());
        Ok(dir)
    }

    /// The directory record at `path`
    pub async fn stat_dir(&self, path: &str) -> Result<DirectoryMetadata, FsError> {
        let path = clean_path(path)?;
        self.read_dir_meta(&path)
            .await?
            .map(|(dir, _)| dir)
            .ok_or_else(|| FsError::not_found(path))
    }

    /// List the children of the directory at `path`, keyed by absolute path.
    ///
    /// Each child's own record is fetched. With `recursive`, every
    /// subdirectory is read the same way. Children that are listed but have
    /// no matching record are skipped.
    pub async fn read_dir(
        &self,
        path: &str,
        recursive: bool,
    ) -> Result<BTreeMap<String, DirItem>, FsError> {
        let path = clean_path(path)?;
        let (dir, _) = self
            .read_dir_meta(&path)
            .await?
            .ok_or_else(|| FsError::not_found(path.clone()))?;

        let mut items = BTreeMap::new();
        let mut queue = VecDeque::from([(path, dir)]);
        while let Some((dir_path, dir)) = queue.pop_front() {
            for entry in &dir.entries {
                let child = join(&dir_path, &entry.name);
                match (entry.kind, self.read_record(&child).await?) {
                    (EntryKind::Directory, Some((Record::Directory(meta), _))) => {
                        if recursive {
                            queue.push_back((child.clone(), meta.clone()));
                        }
                        items.insert(child, DirItem::Directory(meta));
                    }
                    (EntryKind::File, Some((Record::File(meta), _))) => {
                        items.insert(child, DirItem::File(meta));
                    }
                    _ => {
                        tracing::warn!(
                            "Pod::read_dir: {} is listed but has no matching record, skipping",
                            child
                        );
                    }
                }
            }
        }
        Ok(items)
    }

    /// Remove the directory at `path` from its parent.
    ///
    /// Every live descendant record is tombstoned as well, deepest first,
    /// so recreating the directory starts from free names. File contents
    /// and earlier versions stay in the store.
    pub async fn rmdir(&self, path: &str) -> Result<(), FsError> {
        self.signer()?;
        let path = clean_path(path)?;
        let (parent, name) =
            split(&path).ok_or_else(|| FsError::invalid("cannot remove the root directory"))?;

        self.remove_entry(parent, name, EntryKind::Directory)
            .await?;
        if self.read_dir_meta(&path).await?.is_some() {
            let descendants = self.read_dir(&path, true).await?;
            for child in descendants.keys().rev() {
                self.write_tombstone(child).await?;
            }
            tracing::debug!(
                "Pod::rmdir: tombstoned {} records under {}",
                descendants.len(),
                path
            );
        }
        self.write_tombstone(&path).await?;
        tracing::info!("Pod::rmdir: removed {} from pod {}", path, self.name());
        Ok(())
    }
}
