//! Directory metadata
//!
//! On the wire a directory is
//!
//! ```json
//! {
//!   "meta": { "version": 2, "path": "/", "name": "docs",
//!             "creationTime": 1700000000, "modificationTime": 1700000000,
//!             "accessTime": 1700000000 },
//!   "fileOrDirNames": ["_D_drafts", "_F_readme.md"]
//! }
//! ```
//!
//! `meta.path` is the parent's path and `meta.name` the directory's own
//! name; the root is `path = ""`, `name = "/"`. Children are listed by name
//! with a token prefix telling files from directories.
//!
//! Version 1 records predate `accessTime`. Both versions decode into the
//! same [`DirectoryMetadata`]; only the current version is ever written.

use serde::{Deserialize, Serialize};

use crate::error::FsError;

use super::path::{self, ROOT};

pub const FILE_TOKEN: &str = "_F_";
pub const DIR_TOKEN: &str = "_D_";

pub const DIRECTORY_VERSION: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    fn token(&self) -> &'static str {
        match self {
            EntryKind::File => FILE_TOKEN,
            EntryKind::Directory => DIR_TOKEN,
        }
    }
}

/// A named child of a directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    fn to_token(&self) -> String {
        format!("{}{}", self.kind.token(), self.name)
    }

    fn from_token(token: &str) -> Option<Self> {
        if let Some(name) = token.strip_prefix(FILE_TOKEN) {
            return Some(Self::file(name));
        }
        token.strip_prefix(DIR_TOKEN).map(Self::dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMetadata {
    /// Parent path, `""` for the root
    pub path: String,
    pub name: String,
    pub creation_time: i64,
    pub modification_time: i64,
    pub access_time: i64,
    pub entries: Vec<Entry>,
}

impl DirectoryMetadata {
    pub fn root(now: i64) -> Self {
        Self {
            path: String::new(),
            name: ROOT.to_string(),
            creation_time: now,
            modification_time: now,
            access_time: now,
            entries: Vec::new(),
        }
    }

    pub fn new(parent: &str, name: &str, now: i64) -> Self {
        Self {
            path: parent.to_string(),
            name: name.to_string(),
            creation_time: now,
            modification_time: now,
            access_time: now,
            entries: Vec::new(),
        }
    }

    /// Absolute path of this directory
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            ROOT.to_string()
        } else {
            path::join(&self.path, &self.name)
        }
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::File)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Directory)
    }

    /// Add an entry unless one with that name is already listed
    pub fn add(&mut self, entry: Entry) -> bool {
        if self.get(&entry.name).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove the entry with this name and kind
    pub fn remove(&mut self, name: &str, kind: EntryKind) -> Option<Entry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.name == name && e.kind == kind)?;
        Some(self.entries.remove(idx))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, FsError> {
        Ok(serde_json::to_vec(&RawDirectoryMetadata::from(self))?)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, FsError> {
        let probe: VersionProbe = serde_json::from_slice(data)?;
        match probe.meta.version {
            1 => Ok(serde_json::from_slice::<RawDirectoryMetadataV1>(data)?.into()),
            DIRECTORY_VERSION => Ok(serde_json::from_slice::<RawDirectoryMetadata>(data)?.into()),
            v => Err(FsError::Unsupported(format!("directory metadata version {}", v))),
        }
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    meta: VersionOnly,
}

#[derive(Deserialize)]
struct VersionOnly {
    version: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDirectoryMeta {
    pub version: u8,
    pub path: String,
    pub name: String,
    pub creation_time: i64,
    pub modification_time: i64,
    pub access_time: i64,
}

/// Current wire form of a directory record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDirectoryMetadata {
    pub meta: RawDirectoryMeta,
    pub file_or_dir_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDirectoryMetaV1 {
    path: String,
    name: String,
    creation_time: i64,
    modification_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDirectoryMetadataV1 {
    meta: RawDirectoryMetaV1,
    file_or_dir_names: Option<Vec<String>>,
}

/// Decode listing tokens, dropping unknown tokens and repeated names
fn entries_from_tokens(tokens: Option<Vec<String>>) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::new();
    for token in tokens.unwrap_or_default() {
        match Entry::from_token(&token) {
            Some(entry) if !entries.iter().any(|e| e.name == entry.name) => entries.push(entry),
            Some(entry) => {
                tracing::warn!("directory listing repeats {:?}, keeping the first", entry.name)
            }
            None => tracing::warn!("directory listing has unknown entry {:?}", token),
        }
    }
    entries
}

impl From<RawDirectoryMetadataV1> for DirectoryMetadata {
    fn from(raw: RawDirectoryMetadataV1) -> Self {
        Self {
            path: raw.meta.path,
            name: raw.meta.name,
            creation_time: raw.meta.creation_time,
            modification_time: raw.meta.modification_time,
            access_time: raw.meta.modification_time,
            entries: entries_from_tokens(raw.file_or_dir_names),
        }
    }
}

impl From<RawDirectoryMetadata> for DirectoryMetadata {
    fn from(raw: RawDirectoryMetadata) -> Self {
        Self {
            path: raw.meta.path,
            name: raw.meta.name,
            creation_time: raw.meta.creation_time,
            modification_time: raw.meta.modification_time,
            access_time: raw.meta.access_time,
            entries: entries_from_tokens(raw.file_or_dir_names),
        }
    }
}

impl From<&DirectoryMetadata> for RawDirectoryMetadata {
    fn from(dir: &DirectoryMetadata) -> Self {
        let names = dir.entries.iter().map(Entry::to_token).collect::<Vec<_>>();
        Self {
            meta: RawDirectoryMeta {
                version: DIRECTORY_VERSION,
                path: dir.path.clone(),
                name: dir.name.clone(),
                creation_time: dir.creation_time,
                modification_time: dir.modification_time,
                access_time: dir.access_time,
            },
            file_or_dir_names: if names.is_empty() { None } else { Some(names) },
        }
    }
}
