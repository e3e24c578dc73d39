pub mod folder;
pub mod settings;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::quiz::History;
use folder::{AppDataError, AppDataFolder, FileMetadata, LocalAppFolder};
use settings::{JsonSettings, Settings, SettingsError};

/// Settings key under which the id of the app data file is kept.
pub const FILE_ID_KEY: &str = "app_data_file_id";
pub const FILE_TITLE: &str = "Equation File";
pub const FILE_MIME_TYPE: &str = "text/plain";

/// Opaque token naming one app data file across restarts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    AppData(#[from] AppDataError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(FileId),
    Updated(FileId),
}

/// Keeps the quiz history in a single app data file whose id is remembered in settings.
#[derive(Clone)]
pub struct AppDataSync {
    folder: Arc<dyn AppDataFolder>,
    settings: Arc<dyn Settings>,
}

impl AppDataSync {
    pub fn new(folder: Arc<dyn AppDataFolder>, settings: Arc<dyn Settings>) -> Self {
        Self { folder, settings }
    }

    async fn stored_file_id(&self) -> Result<Option<FileId>, SyncError> {
        Ok(self.settings.get(FILE_ID_KEY).await?.map(FileId::new))
    }

    /// Reads past equations from the remembered file, or from the first file in the
    /// app data folder when no file is remembered or the remembered one is gone.
    pub async fn load_history(&self) -> Result<History, SyncError> {
        if let Some(id) = self.stored_file_id().await? {
            match self.folder.read_file(&id).await {
                Ok(text) => {
                    let history = History::from_text(&text);
                    info!("Loaded {} past equation(s) from {}", history.len(), id);
                    return Ok(history);
                }
                Err(AppDataError::NotFound(_)) => {
                    warn!("Remembered app data file {} is missing", id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let files = self.folder.list_files().await?;
        debug!("{} file(s) in app data folder", files.len());

        let Some(first) = files.first() else {
            return Ok(History::default());
        };
        let text = self.folder.read_file(first).await?;
        let history = History::from_text(&text);

        info!("Loaded {} past equation(s) from {}", history.len(), first);
        Ok(history)
    }

    /// Overwrites the remembered file, or creates one and remembers its id.
    pub async fn save_history(&self, history: &History) -> Result<SaveOutcome, SyncError> {
        let contents = history.to_text();

        if let Some(id) = self.stored_file_id().await? {
            self.folder.overwrite_file(&id, &contents).await?;
            debug!("App data successfully updated");
            return Ok(SaveOutcome::Updated(id));
        }

        let metadata = FileMetadata::new(FILE_TITLE, FILE_MIME_TYPE);
        let id = self.folder.create_file(metadata, &contents).await?;
        self.settings.put(FILE_ID_KEY, id.as_str()).await?;
        debug!("App data successfully written, file id stored in settings");
        Ok(SaveOutcome::Created(id))
    }

    /// Deletes the remembered file and forgets its id.
    /// Returns `false` when no file was remembered.
    pub async fn delete_history(&self) -> Result<bool, SyncError> {
        let Some(id) = self.stored_file_id().await? else {
            return Ok(false);
        };

        match self.folder.delete_file(&id).await {
            Ok(()) => {}
            Err(AppDataError::NotFound(_)) => {
                warn!("App data file {} was already gone, forgetting its id", id);
            }
            Err(e) => return Err(e.into()),
        }
        self.settings.remove(FILE_ID_KEY).await?;
        info!("Past equations deleted ({})", id);
        Ok(true)
    }
}

/// Per-account storage: every account gets its own app data folder and settings file.
pub struct Profiles {
    root: PathBuf,
}

impl Profiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn sync_for(&self, account: &str) -> AppDataSync {
        let base = self.root.join(account);
        AppDataSync::new(
            Arc::new(LocalAppFolder::new(base.join("app_data"))),
            Arc::new(JsonSettings::new(base.join("settings.json"))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> History {
        History::new(entries.iter().map(|e| e.to_string()).collect())
    }

    fn sync_in(dir: &std::path::Path) -> (AppDataSync, Arc<LocalAppFolder>, Arc<JsonSettings>) {
        let folder = Arc::new(LocalAppFolder::new(dir.join("app_data")));
        let settings = Arc::new(JsonSettings::new(dir.join("settings.json")));
        let sync = AppDataSync::new(folder.clone(), settings.clone());
        (sync, folder, settings)
    }

    #[tokio::test]
    async fn empty_folder_loads_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, _, _) = sync_in(dir.path());
        assert!(sync.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_save_creates_then_updates() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, folder, settings) = sync_in(dir.path());

        let created = sync.save_history(&history(&["3 + 4 = 7 (correct)"])).await.unwrap();
        let SaveOutcome::Created(id) = created else {
            panic!("expected a new file, got {:?}", created);
        };
        assert_eq!(settings.get(FILE_ID_KEY).await.unwrap().as_deref(), Some(id.as_str()));

        let updated = sync
            .save_history(&history(&["3 + 4 = 8 (wrong)", "3 + 4 = 7 (correct)"]))
            .await
            .unwrap();
        assert_eq!(updated, SaveOutcome::Updated(id.clone()));

        assert_eq!(folder.list_files().await.unwrap(), vec![id.clone()]);
        assert_eq!(
            folder.read_file(&id).await.unwrap(),
            "3 + 4 = 8 (wrong)\n3 + 4 = 7 (correct)\n"
        );
    }

    #[tokio::test]
    async fn saved_history_loads_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, _, _) = sync_in(dir.path());
        let saved = history(&["2 * 3 = 6 (correct)", "9 / 2 = 4 (correct)", "1 - 5 = 4 (wrong)"]);

        sync.save_history(&saved).await.unwrap();

        let (reopened, _, _) = sync_in(dir.path());
        assert_eq!(reopened.load_history().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn delete_removes_file_and_setting() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, folder, settings) = sync_in(dir.path());
        sync.save_history(&history(&["1 + 1 = 2 (correct)"])).await.unwrap();

        assert!(sync.delete_history().await.unwrap());

        assert!(folder.list_files().await.unwrap().is_empty());
        assert_eq!(settings.get(FILE_ID_KEY).await.unwrap(), None);
        assert!(sync.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_forgets_a_file_that_is_already_gone() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, folder, settings) = sync_in(dir.path());
        let SaveOutcome::Created(id) = sync.save_history(&history(&["a"])).await.unwrap() else {
            panic!("expected a new file");
        };
        std::fs::remove_dir_all(folder.root().join(id.as_str())).unwrap();

        assert!(sync.delete_history().await.unwrap());
        assert_eq!(settings.get(FILE_ID_KEY).await.unwrap(), None);

        match sync.save_history(&history(&["b"])).await.unwrap() {
            SaveOutcome::Created(next) => assert_ne!(next, id),
            other => panic!("expected a new file, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn load_prefers_the_remembered_file() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, folder, _) = sync_in(dir.path());

        // An older file nobody remembers, e.g. left behind when storing its id failed
        folder
            .create_file(FileMetadata::new(FILE_TITLE, FILE_MIME_TYPE), "orphan\n")
            .await
            .unwrap();
        sync.save_history(&history(&["current"])).await.unwrap();

        assert_eq!(folder.list_files().await.unwrap().len(), 2);
        assert_eq!(sync.load_history().await.unwrap(), history(&["current"]));
    }

    #[tokio::test]
    async fn load_falls_back_to_listing_when_remembered_file_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, folder, settings) = sync_in(dir.path());
        folder
            .create_file(FileMetadata::new(FILE_TITLE, FILE_MIME_TYPE), "listed\n")
            .await
            .unwrap();
        settings.put(FILE_ID_KEY, "gone").await.unwrap();

        assert_eq!(sync.load_history().await.unwrap(), history(&["listed"]));
    }

    #[tokio::test]
    async fn delete_without_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, _, _) = sync_in(dir.path());
        assert!(!sync.delete_history().await.unwrap());
    }

    #[tokio::test]
    async fn save_after_delete_creates_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, _, _) = sync_in(dir.path());
        let SaveOutcome::Created(first) = sync.save_history(&history(&["a"])).await.unwrap() else {
            panic!("expected a new file");
        };
        sync.delete_history().await.unwrap();

        match sync.save_history(&history(&["b"])).await.unwrap() {
            SaveOutcome::Created(second) => assert_ne!(second, first),
            other => panic!("expected a new file, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn stale_file_id_surfaces_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (sync, _, settings) = sync_in(dir.path());
        settings.put(FILE_ID_KEY, "gone").await.unwrap();

        assert!(matches!(
            sync.save_history(&history(&["a"])).await,
            Err(SyncError::AppData(AppDataError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn profiles_keep_accounts_apart() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = Profiles::new(dir.path());

        profiles.sync_for("100").save_history(&history(&["x"])).await.unwrap();

        assert_eq!(profiles.sync_for("100").load_history().await.unwrap(), history(&["x"]));
        assert!(profiles.sync_for("200").load_history().await.unwrap().is_empty());
    }
}
