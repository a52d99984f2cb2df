//! Preferences file persistence
//!
//! Preferences live in a JSON file under the user's config directory.
//! Fields missing from the file keep their defaults.

use crate::error::PrefsError;
use crate::prefs::Preferences;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Transition records written to disk
pub const PERSISTED_HISTORY_LIMIT: usize = 50;

impl Preferences {
    /// Load preferences from the default location
    ///
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(prefs) => prefs,
            Err(PrefsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable preferences");
                Self::default()
            }
        }
    }

    /// Load preferences from a specific path
    pub fn load_from(path: &Path) -> Result<Self, PrefsError> {
        let content = fs::read_to_string(path)?;
        let prefs = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded preferences");
        Ok(prefs)
    }

    /// Save preferences to the default location
    pub fn save(&self) -> Result<(), PrefsError> {
        self.save_to(&Self::config_path())
    }

    /// Save preferences to a specific path
    ///
    /// Only the newest `PERSISTED_HISTORY_LIMIT` transitions are written.
    pub fn save_to(&self, path: &Path) -> Result<(), PrefsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut persisted = self.clone();
        persisted
            .auto_dj
            .transition_history
            .truncate(PERSISTED_HISTORY_LIMIT);
        fs::write(path, serde_json::to_string_pretty(&persisted)?)?;
        Ok(())
    }

    /// Merge a partial JSON document into these preferences
    ///
    /// Objects merge key by key at any depth; other values replace.
    pub fn import(&mut self, partial: &serde_json::Value) -> Result<(), PrefsError> {
        let mut merged = serde_json::to_value(&*self)?;
        merge_json(&mut merged, partial);
        let runtime = self.runtime;
        *self = serde_json::from_value(merged)?;
        self.runtime = runtime;
        Ok(())
    }

    /// Persistable JSON form of these preferences
    pub fn export(&self) -> Result<serde_json::Value, PrefsError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Get the default preferences file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("segue")
            .join("preferences.json")
    }
}

fn merge_json(target: &mut serde_json::Value, source: &serde_json::Value) {
    match (target, source) {
        (serde_json::Value::Object(target), serde_json::Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
