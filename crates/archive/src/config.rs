//! Configuration loading for the archive viewer
//!
//! Settings are loaded from (in order of priority):
//! 1. An explicit JSON file
//! 2. `settings.json` in the viewer config directory
//! 3. Runtime environment variables (fallback)
//!
//! Relative paths in a settings file are resolved against the file's
//! directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::search::{DEFAULT_DEBOUNCE, SEARCH_LIMIT};
use crate::storage::{ArchiveScope, REDACTED};

/// Settings filename in the viewer config directory
const SETTINGS_FILE: &str = "settings.json";
/// Profiles filename under the data root
const PROFILES_FILE: &str = "contact-profiles.json";

const ENV_DB_PATH: &str = "ARCHIVE_DB_PATH";
const ENV_OWNER: &str = "ARCHIVE_OWNER";
const ENV_DATA_ROOT: &str = "ARCHIVE_DATA_ROOT";

/// Viewer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveSettings {
    /// Identity whose correspondence the archive holds
    pub owner: String,
    /// Counterparty allowlist; absent means every counterparty is shown
    pub contacts: Option<Vec<String>>,
    /// Identities hidden on both sides; the redacted sentinel is always added
    pub excluded: Vec<String>,
    /// SQLite archive file
    pub database_path: PathBuf,
    /// Directory holding `profile_pics/`, `sources/` and the profiles file
    pub data_root: PathBuf,
    /// Profiles file; defaults to `contact-profiles.json` under the data root
    pub profiles_path: Option<PathBuf>,
    /// Quiet period before a typed search runs
    pub debounce_ms: u64,
    /// Maximum rows read per search
    pub search_limit: usize,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            contacts: None,
            excluded: vec![REDACTED.to_string()],
            database_path: PathBuf::from("data/emails.db"),
            data_root: PathBuf::from("data"),
            profiles_path: None,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            search_limit: SEARCH_LIMIT,
        }
    }
}

impl ArchiveSettings {
    /// Load settings using the following priority:
    /// 1. `settings.json` in the viewer config directory
    /// 2. Runtime environment variables
    pub fn load() -> Result<Self> {
        if config::config_exists(SETTINGS_FILE) {
            let path = Self::default_settings_path()
                .context("Could not determine config directory")?;
            return Self::from_file(&path);
        }
        Self::from_env()
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings: Self = config::load_json_file(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        settings.resolved(base).validated()
    }

    /// Parse settings from a JSON string; paths are left as written
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(json).context("Failed to parse settings JSON")?;
        settings.validated()
    }

    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let database_path = std::env::var(ENV_DB_PATH)
            .with_context(|| format!("{} environment variable not set", ENV_DB_PATH))?;
        let owner = std::env::var(ENV_OWNER)
            .with_context(|| format!("{} environment variable not set", ENV_OWNER))?;

        let database_path = PathBuf::from(database_path);
        let data_root = match std::env::var(ENV_DATA_ROOT) {
            Ok(root) => PathBuf::from(root),
            Err(_) => database_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };

        Self {
            owner,
            database_path,
            data_root,
            ..Self::default()
        }
        .validated()
    }

    /// Get the default settings file path (~/.config/archive-viewer/settings.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    /// Check if settings are available (file or env vars)
    pub fn is_available() -> bool {
        config::config_exists(SETTINGS_FILE)
            || (std::env::var(ENV_DB_PATH).is_ok() && std::env::var(ENV_OWNER).is_ok())
    }

    /// Query scope described by these settings
    pub fn scope(&self) -> ArchiveScope {
        let mut scope = ArchiveScope::new(self.owner.clone());
        if let Some(contacts) = &self.contacts {
            scope = scope.with_contacts(contacts.clone());
        }
        for identity in &self.excluded {
            scope = scope.with_excluded(identity.clone());
        }
        scope
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.profiles_path
            .clone()
            .unwrap_or_else(|| self.data_root.join(PROFILES_FILE))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn resolved(mut self, base: &Path) -> Self {
        self.database_path = config::resolve_path(base, &self.database_path);
        self.data_root = config::resolve_path(base, &self.data_root);
        self.profiles_path = self
            .profiles_path
            .map(|p| config::resolve_path(base, &p));
        self
    }

    fn validated(self) -> Result<Self> {
        anyhow::ensure!(!self.owner.trim().is_empty(), "Archive owner is not set");
        anyhow::ensure!(self.search_limit > 0, "Search limit must be positive");
        Ok(self)
    }
}
