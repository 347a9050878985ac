use serde::{Deserialize, Serialize};

use crate::crypto::Secret;
use crate::error::FsError;
use crate::store::Reference;

use super::path::{self, ROOT};

pub const FILE_VERSION: u8 = 2;

/// Canonical file record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Parent directory path
    pub path: String,
    pub name: String,
    pub size: u64,
    pub block_size: u32,
    pub content_type: String,
    /// Always empty; compressed content is not supported
    pub compression: String,
    pub creation_time: i64,
    pub access_time: i64,
    pub modification_time: i64,
    /// Encrypted block manifest
    pub manifest: Reference,
    /// Key for the manifest and blocks when it differs from the pod
    ///  password (files imported from a share)
    pub content_key: Option<Secret>,
}

impl FileMetadata {
    pub fn full_path(&self) -> String {
        path::join(if self.path.is_empty() { ROOT } else { &self.path }, &self.name)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, FsError> {
        Ok(serde_json::to_vec(&RawFileMetadata::from(self))?)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, FsError> {
        let raw: RawFileMetadata = serde_json::from_slice(data)?;
        raw.try_into()
    }
}

/// Wire form of a file record. Older writers used the `file`-prefixed field
/// names, which are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFileMetadata {
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(alias = "filePath")]
    pub path: String,
    #[serde(alias = "fileName")]
    pub name: String,
    #[serde(alias = "fileSize")]
    pub size: u64,
    pub block_size: u32,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub compression: String,
    pub creation_time: i64,
    pub access_time: i64,
    pub modification_time: i64,
    #[serde(alias = "fileInodeReference")]
    pub inode_reference: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks_password: Option<Secret>,
}

fn default_version() -> u8 {
    1
}

impl TryFrom<RawFileMetadata> for FileMetadata {
    type Error = FsError;

    fn try_from(raw: RawFileMetadata) -> Result<Self, Self::Error> {
        if raw.version == 0 || raw.version > FILE_VERSION {
            return Err(FsError::Unsupported(format!(
                "file metadata version {}",
                raw.version
            )));
        }
        Ok(Self {
            path: raw.path,
            name: raw.name,
            size: raw.size,
            block_size: raw.block_size,
            content_type: raw.content_type,
            compression: raw.compression,
            creation_time: raw.creation_time,
            access_time: raw.access_time,
            modification_time: raw.modification_time,
            manifest: raw.inode_reference,
            content_key: raw.blocks_password,
        })
    }
}

impl From<&FileMetadata> for RawFileMetadata {
    fn from(file: &FileMetadata) -> Self {
        Self {
            version: FILE_VERSION,
            path: file.path.clone(),
            name: file.name.clone(),
            size: file.size,
            block_size: file.block_size,
            content_type: file.content_type.clone(),
            compression: file.compression.clone(),
            creation_time: file.creation_time,
            access_time: file.access_time,
            modification_time: file.modification_time,
            inode_reference: file.manifest,
            blocks_password: file.content_key.clone(),
        }
    }
}

/// One encrypted block of file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Plaintext size
    pub size: u32,
    pub compressed_size: u32,
    pub reference: Reference,
}

/// Ordered list of a file's blocks; concatenated in order they are the file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksManifest {
    pub blocks: Vec<Block>,
}

impl BlocksManifest {
    pub fn total_size(&self) -> u64 {
        self.blocks.iter().map(|b| b.size as u64).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> FileMetadata {
        FileMetadata {
            path: "/docs".into(),
            name: "a.txt".into(),
            size: 5,
            block_size: 1024,
            content_type: "text/plain".into(),
            compression: String::new(),
            creation_time: 1,
            access_time: 2,
            modification_time: 3,
            manifest: Reference::of_content(b"manifest"),
            content_key: None,
        }
    }

    #[test]
    fn test_wire_field_names() {
        let file = sample();
        let json: serde_json::Value = serde_json::from_slice(&file.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 2);
        assert_eq!(json["path"], "/docs");
        assert_eq!(json["blockSize"], 1024);
        assert_eq!(json["contentType"], "text/plain");
        assert_eq!(json["compression"], "");
        assert_eq!(json["inodeReference"], file.manifest.to_hex());
        assert!(json.get("blocksPassword").is_none());
        assert_eq!(file.full_path(), "/docs/a.txt");

        assert_eq!(FileMetadata::from_json(&file.to_json().unwrap()).unwrap(), file);
    }

    #[test]
    fn test_legacy_field_names() {
        let reference = Reference::of_content(b"m");
        let legacy = format!(
            r#"{{"filePath": "/", "fileName": "old.bin", "fileSize": 9, "blockSize": 4,
                "creationTime": 1, "accessTime": 1, "modificationTime": 1,
                "fileInodeReference": "{}"}}"#,
            reference.to_hex()
        );
        let file = FileMetadata::from_json(legacy.as_bytes()).unwrap();
        assert_eq!(file.full_path(), "/old.bin");
        assert_eq!(file.size, 9);
        assert_eq!(file.manifest, reference);
        assert!(file.compression.is_empty());
    }

    #[test]
    fn test_content_key_on_the_wire() {
        let mut file = sample();
        file.content_key = Some(Secret::from([7u8; 32]));
        let json: serde_json::Value = serde_json::from_slice(&file.to_json().unwrap()).unwrap();
        assert_eq!(json["blocksPassword"], "07".repeat(32));
        assert_eq!(FileMetadata::from_json(&file.to_json().unwrap()).unwrap(), file);
    }

    #[test]
    fn test_manifest_wire_form() {
        let manifest = BlocksManifest {
            blocks: vec![
                Block {
                    name: None,
                    size: 4,
                    compressed_size: 4,
                    reference: Reference::of_content(b"0"),
                },
                Block {
                    name: Some("block-1".into()),
                    size: 1,
                    compressed_size: 1,
                    reference: Reference::of_content(b"1"),
                },
            ],
        };
        assert_eq!(manifest.total_size(), 5);

        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json["blocks"][0].get("name").is_none());
        assert_eq!(json["blocks"][1]["compressedSize"], 1);
    }
}
