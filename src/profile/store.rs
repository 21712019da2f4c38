//! Persisted profile catalog (`profiles.json`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::schema::{PersistedProfile, Profile, names_match};
use crate::atomic::{preserve_corrupt, write_json_atomic};
use crate::error::{Result, RsError};

/// Result of a rename request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed { from: String },
    /// The new name equals the current one; nothing was changed.
    Unchanged,
}

/// Owner of the profile catalog.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<Profile>,
}

impl ProfileStore {
    /// Load the catalog at `path`.
    ///
    /// Missing, empty or malformed files load as an empty catalog; a
    /// malformed file is kept as `profiles.json.corrupt`.
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Starting with an empty profile catalog");
                preserve_corrupt(&path);
                Vec::new()
            }
        };

        let profiles = validate_entries(entries);
        info!(profiles = profiles.len(), "Profile catalog loaded");
        Self { path, profiles }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, folder_id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.folder_id == folder_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.has_name(name))
    }

    /// Look up by name first, then by folder id.
    pub fn resolve(&self, name_or_id: &str) -> Option<&Profile> {
        self.find_by_name(name_or_id)
            .or_else(|| self.get(name_or_id.trim()))
    }

    /// Add a profile; the catalog is not persisted.
    pub fn add(&mut self, profile: Profile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(RsError::InvalidName("profile name cannot be blank".to_string()));
        }
        if self.find_by_name(&profile.name).is_some() {
            return Err(RsError::DuplicateName { name: profile.name });
        }
        if self.get(&profile.folder_id).is_some() {
            return Err(RsError::Other(format!(
                "Folder id already in use: {}",
                profile.folder_id
            )));
        }
        debug!(name = %profile.name, folder_id = %profile.folder_id, "Profile added");
        self.profiles.push(profile);
        Ok(())
    }

    /// Rename the profile owning `folder_id`; the catalog is not persisted.
    #[instrument(skip(self))]
    pub fn rename(&mut self, folder_id: &str, new_name: &str) -> Result<RenameOutcome> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(RsError::InvalidName("profile name cannot be blank".to_string()));
        }

        let current = self
            .get(folder_id)
            .ok_or_else(|| RsError::ProfileNotFound {
                name: folder_id.to_string(),
            })?;
        if current.name == new_name {
            warn!(name = new_name, "Rename to the current name ignored");
            return Ok(RenameOutcome::Unchanged);
        }
        if self
            .profiles
            .iter()
            .any(|p| p.folder_id != folder_id && p.has_name(new_name))
        {
            return Err(RsError::DuplicateName {
                name: new_name.to_string(),
            });
        }

        let profile = self
            .profiles
            .iter_mut()
            .find(|p| p.folder_id == folder_id)
            .ok_or_else(|| RsError::ProfileNotFound {
                name: folder_id.to_string(),
            })?;
        let from = std::mem::replace(&mut profile.name, new_name.to_string());
        info!(from = %from, to = new_name, "Profile renamed");
        Ok(RenameOutcome::Renamed { from })
    }

    /// Remove the catalog entry only; the data directory is left alone.
    pub fn remove(&mut self, folder_id: &str) -> Result<Profile> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.folder_id == folder_id)
            .ok_or_else(|| RsError::ProfileNotFound {
                name: folder_id.to_string(),
            })?;
        let profile = self.profiles.remove(index);
        debug!(name = %profile.name, "Profile removed from catalog");
        Ok(profile)
    }

    /// Write the full catalog atomically.
    pub fn persist(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.profiles)?;
        debug!(path = %self.path.display(), profiles = self.profiles.len(), "Catalog persisted");
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<Vec<PersistedProfile>> {
    if !path.exists() {
        debug!("No profile catalog yet");
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content)
        .map_err(|e| RsError::CatalogParse(format!("{}: {e}", path.display())))
}

/// Drop incomplete entries and entries reusing a folder id or a name.
fn validate_entries(entries: Vec<PersistedProfile>) -> Vec<Profile> {
    let mut seen_ids = HashSet::new();
    let mut profiles: Vec<Profile> = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(profile) = entry.validate() else {
            warn!("Dropping catalog entry without a name or a usable folder id");
            continue;
        };
        if !seen_ids.insert(profile.folder_id.clone()) {
            warn!(folder_id = %profile.folder_id, "Dropping catalog entry with duplicate folder id");
            continue;
        }
        if profiles.iter().any(|p| names_match(&p.name, &profile.name)) {
            warn!(name = %profile.name, "Dropping catalog entry with duplicate name");
            continue;
        }
        profiles.push(profile);
    }
    profiles
}
