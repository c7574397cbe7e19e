// SPDX-License-Identifier: MPL-2.0

use crate::config::{APP_ID, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::state::favorites::FavoritesSort;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Where the dictionary comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// The JSON bundle shipped with the app.
    Bundle,
    /// The sync API, with the on-disk snapshot as fallback.
    #[default]
    Sync,
}

/// Persistent application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    #[serde(default)]
    pub data_mode: DataMode,
    /// Bundle location for `DataMode::Bundle`.
    #[serde(default)]
    pub bundle_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub favorites_sort: FavoritesSort,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base(),
            data_mode: DataMode::default(),
            bundle_path: None,
            request_timeout_secs: default_request_timeout(),
            favorites_sort: FavoritesSort::default(),
        }
    }
}

/// Fields to overwrite; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub data_mode: Option<DataMode>,
    pub api_base_url: Option<String>,
    pub bundle_path: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub favorites_sort: Option<FavoritesSort>,
}

impl AppSettings {
    /// Apply `change` if the result is usable. Returns whether anything
    /// actually changed; on error `self` is left as it was.
    pub fn apply(&mut self, change: SettingsChange) -> Result<bool, SettingsError> {
        let mut next = self.clone();
        if let Some(mode) = change.data_mode {
            next.data_mode = mode;
        }
        if let Some(url) = change.api_base_url {
            next.api_base_url = url;
        }
        if let Some(path) = change.bundle_path {
            next.bundle_path = Some(path);
        }
        if let Some(secs) = change.request_timeout_secs {
            next.request_timeout_secs = secs;
        }
        if let Some(sort) = change.favorites_sort {
            next.favorites_sort = sort;
        }
        next.validate()?;

        if next == *self {
            return Ok(false);
        }
        info!(?next, "settings changed");
        *self = next;
        Ok(true)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| SettingsError::Invalid(format!("{}: {e}", self.api_base_url)))?;
        if url.cannot_be_a_base() {
            return Err(SettingsError::Invalid(self.api_base_url.clone()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid("request timeout must be positive".into()));
        }
        if self.data_mode == DataMode::Bundle && self.bundle_path.is_none() {
            return Err(SettingsError::Invalid("bundle mode needs a bundle path".into()));
        }
        Ok(())
    }

    /// Get the settings file path (~/.config/ru.rsl.Dictionary/settings.json)
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push(APP_ID);
            p.push("settings.json");
            p
        })
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let dir = path.parent().ok_or(SettingsError::NoConfigDir)?;
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
