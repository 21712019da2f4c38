//! Profile catalog entries.

use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named snapshot of the included managed keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Names the profile's directory under `profile_data/`; never changes.
    #[serde(rename = "folderNameGuid")]
    pub folder_id: String,
    #[serde(rename = "creationDate")]
    pub creation_timestamp: DateTime<Utc>,
    /// Snapshot files actually exported. `None` for entries written before
    /// the list was recorded.
    #[serde(
        rename = "includedKeyFiles",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub included_key_files: Option<Vec<String>>,
}

impl Profile {
    /// New profile with a fresh folder id, created now.
    #[must_use]
    pub fn new(name: &str, included_key_files: Vec<String>) -> Self {
        Self {
            name: name.trim().to_string(),
            folder_id: Uuid::new_v4().to_string(),
            creation_timestamp: Utc::now(),
            included_key_files: Some(included_key_files),
        }
    }

    #[must_use]
    pub fn with_folder_id(mut self, folder_id: &str) -> Self {
        self.folder_id = folder_id.to_string();
        self
    }

    /// Case-insensitive comparison after trimming.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Profile names are compared case-insensitively after trimming.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Loosely-typed catalog entry as found on disk.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PersistedProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "folderNameGuid")]
    pub folder_id: Option<String>,
    #[serde(default, rename = "creationDate")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default, rename = "includedKeyFiles")]
    pub included_key_files: Option<Vec<String>>,
}

impl PersistedProfile {
    /// Validate into a [`Profile`]; `None` if name or folder id is missing,
    /// or the folder id is not a plain directory name.
    ///
    /// A missing timestamp becomes the Unix epoch so the entry still sorts.
    pub fn validate(self) -> Option<Profile> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        let folder_id = self.folder_id.filter(|f| is_plain_dir_name(f))?;
        Some(Profile {
            name: name.trim().to_string(),
            folder_id,
            creation_timestamp: self.creation_timestamp.unwrap_or_default(),
            included_key_files: self.included_key_files,
        })
    }
}

/// Exactly one normal path component: no separators, `..`, roots or
/// drive prefixes.
fn is_plain_dir_name(name: &str) -> bool {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
