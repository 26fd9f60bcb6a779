use crate::achievements::{default_achievements, merge_with_defaults, Achievement};
use crate::app_dirs::AppDirs;
use crate::error::Result;
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Where the achievement list lives between runs
pub trait AchievementStore: fmt::Debug {
    /// Stored achievements, or the built-in defaults when nothing usable is stored.
    fn load(&self) -> Vec<Achievement>;
    fn save(&self, achievements: &[Achievement]) -> Result<()>;
}

/// JSON file holding the flat achievement list
#[derive(Debug, Clone)]
pub struct FileAchievementStore {
    path: PathBuf,
}

impl FileAchievementStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::achievements_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileAchievementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementStore for FileAchievementStore {
    fn load(&self) -> Vec<Achievement> {
        let Ok(bytes) = fs::read(&self.path) else {
            debug!("no achievements at {}", self.path.display());
            return default_achievements();
        };

        match serde_json::from_slice::<Vec<Achievement>>(&bytes) {
            Ok(stored) => merge_with_defaults(stored),
            Err(e) => {
                warn!("ignoring malformed achievements file {}: {e}", self.path.display());
                default_achievements()
            }
        }
    }

    fn save(&self, achievements: &[Achievement]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(achievements)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// In-process achievement list; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryAchievementStore {
    saved: Arc<Mutex<Option<Vec<Achievement>>>>,
}

impl MemoryAchievementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// What was last saved, if anything.
    pub fn saved(&self) -> Option<Vec<Achievement>> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AchievementStore for MemoryAchievementStore {
    fn load(&self) -> Vec<Achievement> {
        self.saved()
            .map(merge_with_defaults)
            .unwrap_or_else(default_achievements)
    }

    fn save(&self, achievements: &[Achievement]) -> Result<()> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(achievements.to_vec());
        Ok(())
    }
}
