//! Contact profile directory loaded from `contact-profiles.json`

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use log::{error, info};
use serde::{Deserialize, Serialize};

use super::traits::ProfileStore;
use crate::models::Profile;

/// On-disk layout: `{"contacts": {"<lowercased identity>": {...}}}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    contacts: HashMap<String, Profile>,
}

/// Profiles keyed by lowercased identity
#[derive(Debug, Clone, Default)]
pub struct ProfileDirectory {
    profiles: HashMap<String, Profile>,
}

impl ProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load profiles from `path`
    ///
    /// A missing or unreadable file is logged and yields an empty directory;
    /// the viewer then falls back to raw identities and initials.
    pub fn load(path: &Path) -> Self {
        match config::load_json_file::<ProfileFile>(path) {
            Ok(file) => {
                let directory = Self::from_entries(file.contacts);
                info!(
                    "Loaded {} contact profiles from {}",
                    directory.len(),
                    path.display()
                );
                directory
            }
            Err(e) => {
                error!("Failed to load contact profiles from {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ProfileFile = serde_json::from_str(json)?;
        Ok(Self::from_entries(file.contacts))
    }

    fn from_entries(entries: HashMap<String, Profile>) -> Self {
        Self {
            profiles: entries
                .into_iter()
                .map(|(key, profile)| (key.to_lowercase(), profile))
                .collect(),
        }
    }

    pub fn insert(&mut self, identity: &str, profile: Profile) {
        self.profiles.insert(identity.to_lowercase(), profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileStore for ProfileDirectory {
    fn get_profile(&self, identity: &str) -> Profile {
        self.profiles
            .get(&identity.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "contacts": {
            "ken starr": {"displayName": "Kenneth Starr", "image": "starr.jpg"},
            "alice": {"displayName": "Alice B."}
        }
    }"#;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let directory = ProfileDirectory::from_json(SAMPLE).unwrap();
        let profile = directory.get_profile("Ken Starr");
        assert_eq!(profile.display_name.as_deref(), Some("Kenneth Starr"));
        assert_eq!(profile.image.as_deref(), Some("starr.jpg"));
    }

    #[test]
    fn test_unknown_identity_yields_empty_profile() {
        let directory = ProfileDirectory::from_json(SAMPLE).unwrap();
        assert_eq!(directory.get_profile("Nobody"), Profile::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contact-profiles.json");
        fs::write(&path, SAMPLE).unwrap();

        let directory = ProfileDirectory::load(&path);
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_load_failure_is_empty() {
        let dir = TempDir::new().unwrap();
        let missing = ProfileDirectory::load(&dir.path().join("missing.json"));
        assert!(missing.is_empty());

        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(ProfileDirectory::load(&path).is_empty());
    }
}
