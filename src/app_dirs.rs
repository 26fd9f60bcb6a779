use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keystride";

/// Fixed storage key for the persisted achievement list.
pub const ACHIEVEMENTS_FILE: &str = "typing-achievements.json";
pub const HISTORY_DB_FILE: &str = "typing-history.db";
pub const CONFIG_FILE: &str = "config.json";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|pd| pd.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(format!("{APP_NAME}_{CONFIG_FILE}")))
    }

    pub fn achievements_path() -> PathBuf {
        Self::project_dirs()
            .map(|pd| pd.data_local_dir().join(ACHIEVEMENTS_FILE))
            .unwrap_or_else(|| PathBuf::from(ACHIEVEMENTS_FILE))
    }

    pub fn history_db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join(HISTORY_DB_FILE))
        } else {
            Self::project_dirs().map(|pd| pd.data_local_dir().join(HISTORY_DB_FILE))
        }
    }
}
