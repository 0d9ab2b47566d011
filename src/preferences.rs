//! Display preferences owned by the presentation layer.
//!
//! The quiz core never reads these; they are loaded once at startup and
//! written back whenever the client toggles one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dark_mode: bool,
    pub muted: bool,
}

impl Preferences {
    pub fn apply(&mut self, patch: &PreferencesPatch) {
        if let Some(dark_mode) = patch.dark_mode {
            self.dark_mode = dark_mode;
        }
        if let Some(muted) = patch.muted {
            self.muted = muted;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    pub dark_mode: Option<bool>,
    pub muted: Option<bool>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreferencesError {
    #[error("preferences io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load(&self) -> Result<Preferences, PreferencesError>;
    async fn save(&self, prefs: Preferences) -> Result<(), PreferencesError>;
}

/// On-disk layout, one flag per key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(default)]
    grammar_dark_mode: bool,
    #[serde(default)]
    grammar_muted: bool,
}

pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferenceStore {
    async fn load(&self) -> Result<Preferences, PreferencesError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Preferences::default())
            }
            Err(err) => return Err(err.into()),
        };
        let stored: StoredPreferences = serde_json::from_str(&raw)?;
        Ok(Preferences {
            dark_mode: stored.grammar_dark_mode,
            muted: stored.grammar_muted,
        })
    }

    async fn save(&self, prefs: Preferences) -> Result<(), PreferencesError> {
        let stored = StoredPreferences {
            grammar_dark_mode: prefs.dark_mode,
            grammar_muted: prefs.muted,
        };
        let serialized = serde_json::to_vec_pretty(&stored)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

/// Keeps preferences for the lifetime of the process only.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    prefs: RwLock<Preferences>,
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load(&self) -> Result<Preferences, PreferencesError> {
        Ok(*self.prefs.read().await)
    }

    async fn save(&self, prefs: Preferences) -> Result<(), PreferencesError> {
        *self.prefs.write().await = prefs;
        Ok(())
    }
}
