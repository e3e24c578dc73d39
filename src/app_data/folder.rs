use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::fs;

use super::FileId;

const CONTENTS_FILE: &str = "contents";
const METADATA_FILE: &str = "metadata.json";

#[derive(Error, Debug)]
pub enum AppDataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("App data file not found: {0}")]
    NotFound(FileId),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileMetadata {
    pub title: String,
    pub mime_type: String,
    /// Milliseconds since the Unix epoch, stamped by the folder when the file is created.
    #[serde(default)]
    created_at: u64,
}

impl FileMetadata {
    pub fn new(title: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            mime_type: mime_type.into(),
            created_at: 0,
        }
    }

    /// Zero until the metadata has been stored by a folder.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

/// An application-private folder holding files that are hidden from the user's own file listing.
#[async_trait]
pub trait AppDataFolder: Send + Sync {
    async fn create_file(&self, metadata: FileMetadata, contents: &str) -> Result<FileId, AppDataError>;
    async fn list_files(&self) -> Result<Vec<FileId>, AppDataError>;
    async fn read_file(&self, id: &FileId) -> Result<String, AppDataError>;
    async fn overwrite_file(&self, id: &FileId, contents: &str) -> Result<(), AppDataError>;
    async fn delete_file(&self, id: &FileId) -> Result<(), AppDataError>;
}

/// App data folder kept on the local filesystem.
///
/// Every file is a directory named after its id, holding the raw contents and a metadata document.
pub struct LocalAppFolder {
    root: PathBuf,
}

impl LocalAppFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_dir(&self, id: &FileId) -> PathBuf {
        self.root.join(id.as_str())
    }

    async fn existing_file_dir(&self, id: &FileId) -> Result<PathBuf, AppDataError> {
        let dir = self.file_dir(id);
        if !fs::try_exists(dir.join(CONTENTS_FILE)).await? {
            return Err(AppDataError::NotFound(id.clone()));
        }
        Ok(dir)
    }

    async fn read_metadata(&self, dir: &Path) -> Result<FileMetadata, AppDataError> {
        let raw = fs::read(dir.join(METADATA_FILE)).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[async_trait]
impl AppDataFolder for LocalAppFolder {
    async fn create_file(&self, mut metadata: FileMetadata, contents: &str) -> Result<FileId, AppDataError> {
        let id = FileId::generate();
        let dir = self.file_dir(&id);
        fs::create_dir_all(&dir).await?;

        metadata.created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        fs::write(dir.join(METADATA_FILE), serde_json::to_vec_pretty(&metadata)?).await?;
        fs::write(dir.join(CONTENTS_FILE), contents).await?;

        debug!("Created app data file {} ({})", id, metadata.title);
        Ok(id)
    }

    async fn list_files(&self) -> Result<Vec<FileId>, AppDataError> {
        if !fs::try_exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir = entry.path();
            if !fs::try_exists(dir.join(CONTENTS_FILE)).await? {
                continue;
            }
            let metadata = self.read_metadata(&dir).await?;
            let id = FileId::new(entry.file_name().to_string_lossy().into_owned());
            files.push((metadata.created_at, id));
        }

        files.sort();
        Ok(files.into_iter().map(|(_, id)| id).collect())
    }

    async fn read_file(&self, id: &FileId) -> Result<String, AppDataError> {
        let dir = self.existing_file_dir(id).await?;
        Ok(fs::read_to_string(dir.join(CONTENTS_FILE)).await?)
    }

    async fn overwrite_file(&self, id: &FileId, contents: &str) -> Result<(), AppDataError> {
        let dir = self.existing_file_dir(id).await?;
        fs::write(dir.join(CONTENTS_FILE), contents).await?;
        debug!("Overwrote app data file {}", id);
        Ok(())
    }

    async fn delete_file(&self, id: &FileId) -> Result<(), AppDataError> {
        let dir = self.existing_file_dir(id).await?;
        fs::remove_dir_all(dir).await?;
        debug!("Deleted app data file {}", id);
        Ok(())
    }
}
