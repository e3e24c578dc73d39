use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed settings file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Local key-value settings that survive restarts.
#[async_trait]
pub trait Settings: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), SettingsError>;
    async fn remove(&self, key: &str) -> Result<(), SettingsError>;
}

/// Settings stored as a flat JSON object in a single file.
pub struct JsonSettings {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, SettingsError> {
        match fs::read(&self.path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, values: &BTreeMap<String, String>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(values)?).await?;
        Ok(())
    }
}

#[async_trait]
impl Settings for JsonSettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        Ok(values.remove(key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.store(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_some() {
            self.store(&values).await?;
        }
        Ok(())
    }
}
