//! Persisted configuration store.
//!
//! Merges the compiled-in key definitions with `config.json` and writes the
//! merged result back, so the file always lists the full, current key set.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::schema::{
    Config, DEFAULT_PROFILE_NAME, ManagedKeyDefinition, ManagedKeyState, PersistedConfig,
};
use crate::atomic::{preserve_corrupt, write_json_atomic};
use crate::error::{Result, RsError};

/// Owner of the [`Config`].
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    definitions: Vec<ManagedKeyDefinition>,
    config: Config,
}

impl ConfigStore {
    /// Load `path`, merge it with `definitions`, and persist the result.
    ///
    /// An unreadable file is preserved as `config.json.corrupt` and replaced
    /// by defaults; this never fails.
    #[instrument(skip(definitions), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>, definitions: Vec<ManagedKeyDefinition>) -> Self {
        let path = path.as_ref().to_path_buf();
        let persisted = match read_persisted(&path) {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Falling back to default configuration");
                preserve_corrupt(&path);
                None
            }
        };

        let config = merge(&definitions, persisted);
        let store = Self {
            path,
            definitions,
            config,
        };

        if let Err(e) = store.save() {
            warn!(error = %e, "Could not persist merged configuration");
        }
        info!(
            keys = store.config.managed_keys.len(),
            included = store.config.included().count(),
            "Configuration loaded"
        );
        store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn definitions(&self) -> &[ManagedKeyDefinition] {
        &self.definitions
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keys currently marked for inclusion.
    pub fn included_keys(&self) -> Vec<ManagedKeyState> {
        self.config.included().cloned().collect()
    }

    /// Definition owning `file_name`, if any.
    pub fn definition_for_file(&self, file_name: &str) -> Option<&ManagedKeyDefinition> {
        self.definitions
            .iter()
            .find(|d| d.file_name.eq_ignore_ascii_case(file_name))
    }

    /// Write the full configuration atomically.
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.config)?;
        debug!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Set the inclusion flag of the key at `path` and persist.
    #[instrument(skip(self))]
    pub fn set_inclusion(&mut self, path: &str, included: bool) -> Result<()> {
        let key = self
            .config
            .managed_keys
            .iter_mut()
            .find(|k| k.path == path)
            .ok_or_else(|| RsError::KeyNotFound {
                key: path.to_string(),
            })?;
        key.is_included = included;
        info!(key = %key.friendly_name, included, "Inclusion changed");
        self.save()
    }

    /// Flip the inclusion flag of the key at `path`; returns the new value.
    pub fn toggle_inclusion(&mut self, path: &str) -> Result<bool> {
        let current = self
            .config
            .managed_keys
            .iter()
            .find(|k| k.path == path)
            .map(|k| k.is_included)
            .ok_or_else(|| RsError::KeyNotFound {
                key: path.to_string(),
            })?;
        self.set_inclusion(path, !current)?;
        Ok(!current)
    }

    /// Change the name used when a save is requested without one.
    #[instrument(skip(self))]
    pub fn set_default_profile_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RsError::InvalidName(
                "default profile name cannot be blank".to_string(),
            ));
        }
        self.config.default_profile_name = name.to_string();
        info!(name, "Default profile name changed");
        self.save()
    }
}

fn read_persisted(path: &Path) -> Result<Option<PersistedConfig>> {
    if !path.exists() {
        debug!(path = %path.display(), "No configuration file yet");
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| RsError::ConfigParse(format!("{}: {e}", path.display())))
}

/// Definitions drive the key set; persisted data only contributes
/// `is_included` and the default profile name.
fn merge(definitions: &[ManagedKeyDefinition], persisted: Option<PersistedConfig>) -> Config {
    let mut config = Config::from_definitions(definitions);
    let Some(persisted) = persisted else {
        return config;
    };

    if let Some(name) = persisted.default_profile_name {
        let name = name.trim();
        config.default_profile_name = if name.is_empty() {
            DEFAULT_PROFILE_NAME.to_string()
        } else {
            name.to_string()
        };
    }

    for key in &mut config.managed_keys {
        let stored = persisted
            .managed_keys
            .iter()
            .find(|p| p.path.as_deref() == Some(key.path.as_str()));
        if let Some(included) = stored.and_then(|p| p.is_included) {
            key.is_included = included;
        }
    }

    let dropped = persisted
        .managed_keys
        .iter()
        .filter(|p| {
            p.path
                .as_deref()
                .is_none_or(|path| !definitions.iter().any(|d| d.path == path))
        })
        .count();
    if dropped > 0 {
        debug!(dropped, "Dropped stale managed-key entries");
    }

    config
}
