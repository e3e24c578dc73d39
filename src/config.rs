use std::path::PathBuf;

const DEFAULT_APP_DATA_DIR: &str = "app_data";
const DEFAULT_DIALOGUE_DB: &str = "db.sqlite";

/// Runtime settings read from the environment (and `.env`, once loaded).
/// The bot token itself is picked up by `Bot::from_env` from `TELOXIDE_TOKEN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub app_data_dir: PathBuf,
    pub dialogue_db: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            app_data_dir: non_empty("APP_DATA_DIR")
                .unwrap_or_else(|| DEFAULT_APP_DATA_DIR.to_string())
                .into(),
            dialogue_db: non_empty("DIALOGUE_DB").unwrap_or_else(|| DEFAULT_DIALOGUE_DB.to_string()),
        }
    }
}
