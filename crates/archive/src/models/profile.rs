//! Contact display profile and avatar fallback

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Display metadata for a contact
///
/// Every field is optional; an empty profile falls back to the raw identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    /// File name of the profile picture under `profile_pics/`
    #[serde(default)]
    pub image: Option<String>,
}

impl Profile {
    /// Name to show for `identity`, preferring the profile's display name
    pub fn display_name_or<'a>(&'a self, identity: &'a str) -> &'a str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(identity)
    }

    /// Path of the profile picture under the archive data root
    pub fn image_path(&self, data_root: &Path) -> Option<PathBuf> {
        self.image
            .as_deref()
            .filter(|image| !image.is_empty())
            .map(|image| data_root.join("profile_pics").join(image))
    }
}

/// What to render in a contact's avatar slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Avatar {
    /// Profile picture; `initials` is shown if the image fails to load
    Image {
        path: PathBuf,
        alt: String,
        initials: String,
    },
    Initials(String),
}

impl Avatar {
    pub fn for_contact(identity: &str, profile: &Profile, data_root: &Path) -> Self {
        let name = profile.display_name_or(identity);
        let initials = initials(name);
        match profile.image_path(data_root) {
            Some(path) => Avatar::Image {
                path,
                alt: name.to_string(),
                initials,
            },
            None => Avatar::Initials(initials),
        }
    }
}

/// Two-letter initials for a name
///
/// Multi-word names use the first letter of the first and last word; single
/// words use their first two characters.
pub fn initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let raw: String = match parts.as_slice() {
        [] => return "?".to_string(),
        [only] => only.chars().take(2).collect(),
        [first, .., last] => first.chars().take(1).chain(last.chars().take(1)).collect(),
    };
    raw.to_uppercase()
}
