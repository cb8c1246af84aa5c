//! Persisted per-profile state: the session id and the chosen language.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use concierge_core::{Language, SessionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ContentError;

/// What survives a restart. Both fields are optional so a fresh profile and
/// a partially written file load the same way.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<StoredPreferences, ContentError>;
    fn save(&self, prefs: &StoredPreferences) -> Result<(), ContentError>;
}

/// JSON file, `session.json` in the data directory by convention.
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferences {
    fn load(&self) -> Result<StoredPreferences, ContentError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored preferences");
                return Ok(StoredPreferences::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| {
            ContentError::Preferences(format!("{}: {}", self.path.display(), e))
        })
    }

    fn save(&self, prefs: &StoredPreferences) -> Result<(), ContentError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(prefs)
            .map_err(|e| ContentError::Preferences(e.to_string()))?;
        std::fs::write(&self.path, body)?;
        debug!(path = %self.path.display(), "Preferences saved");
        Ok(())
    }
}

/// Keeps preferences for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryPreferences {
    inner: Mutex<StoredPreferences>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(prefs: StoredPreferences) -> Self {
        Self {
            inner: Mutex::new(prefs),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self) -> Result<StoredPreferences, ContentError> {
        self.inner
            .lock()
            .map(|p| p.clone())
            .map_err(|e| ContentError::Preferences(format!("lock poisoned: {}", e)))
    }

    fn save(&self, prefs: &StoredPreferences) -> Result<(), ContentError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| ContentError::Preferences(format!("lock poisoned: {}", e)))?;
        *guard = prefs.clone();
        Ok(())
    }
}
