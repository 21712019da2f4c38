//! Profile lifecycle workflows.
//!
//! [`ProfileManager`] is the only component that both drives the registry
//! and mutates the catalogs. Multi-key workflows never abort on a per-key
//! failure; they collect a [`KeyOutcome`] per key and derive an
//! [`OverallStatus`].
//!
//! # Overwrite protocol
//!
//! Saving over an existing profile writes the new snapshot under a fresh
//! folder id first. The old entry is swapped out of the catalog only after
//! every export succeeded, and its directory is deleted last. A failed save
//! leaves the old profile untouched.

mod report;

pub use report::{
    DeleteReport, KeyAction, KeyOutcome, LoadReport, OverallStatus, RemoveReport, SaveReport,
};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::backup::BackupRotator;
use crate::config::{Config, ConfigStore, StoragePaths, is_snapshot_file, key_identifier};
use crate::error::{Result, RsError};
use crate::profile::{Profile, RenameOutcome};
use crate::prompt::Prompter;
use crate::registry::{BoxedRegistry, first_key_path};
use crate::state::AppContext;

/// What to do with orphaned snapshot files on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Ask the prompter once for all orphans.
    #[default]
    Ask,
    Import,
    /// Report only.
    Skip,
}

/// Orchestrates save, load, delete and rename.
pub struct ProfileManager {
    ctx: AppContext,
    registry: BoxedRegistry,
}

impl std::fmt::Debug for ProfileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileManager")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl ProfileManager {
    pub fn new(ctx: AppContext, registry: BoxedRegistry) -> Self {
        Self { ctx, registry }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.ctx.paths
    }

    pub fn profiles(&self) -> &[Profile] {
        self.ctx.profiles.list()
    }

    pub fn config(&self) -> &Config {
        self.ctx.config.config()
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.ctx.config
    }

    pub fn backups(&self) -> &BackupRotator {
        &self.ctx.backups
    }

    /// Look up a profile by name or folder id.
    pub fn find_profile(&self, name_or_id: &str) -> Result<&Profile> {
        self.ctx
            .profiles
            .resolve(name_or_id)
            .ok_or_else(|| RsError::ProfileNotFound {
                name: name_or_id.trim().to_string(),
            })
    }

    /// Snapshot every included key into a new profile named `name`.
    ///
    /// A blank name means the configured default. Saving over an existing
    /// name asks the prompter first.
    #[instrument(skip(self, prompter))]
    pub fn save_profile(&mut self, name: &str, prompter: &mut dyn Prompter) -> Result<SaveReport> {
        let name = match name.trim() {
            "" => self.config().default_profile_name.clone(),
            trimmed => trimmed.to_string(),
        };

        let existing = self.ctx.profiles.find_by_name(&name).cloned();
        if let Some(old) = &existing {
            let question = format!("Profile '{}' already exists. Overwrite it?", old.name);
            if !prompter.confirm(&question) {
                info!(name = %name, "Save cancelled");
                return Ok(SaveReport::cancelled(&name));
            }
        }

        let mut profile = Profile::new(&name, Vec::new());
        let dir = self.ctx.paths.profile_dir(&profile.folder_id);
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Created profile directory");

        let mut keys = Vec::new();
        let mut exported = Vec::new();
        for key in self.ctx.config.included_keys() {
            if !self.registry.exists(&key.path) {
                debug!(key = %key.path, "Live key absent, skipping");
                keys.push(KeyOutcome::for_key(&key, KeyAction::SkippedAbsent));
                continue;
            }
            match self.registry.export(&key.path, &dir.join(&key.file_name)) {
                Ok(()) => {
                    exported.push(key.file_name.clone());
                    keys.push(KeyOutcome::for_key(&key, KeyAction::Exported));
                }
                Err(e) => {
                    warn!(key = %key.path, error = %e, "Export failed");
                    keys.push(KeyOutcome::for_key(
                        &key,
                        KeyAction::Failed {
                            error: e.to_string(),
                        },
                    ));
                }
            }
        }

        let status = OverallStatus::from_outcomes(&keys);
        if status != OverallStatus::FullSuccess {
            remove_dir_best_effort(&dir);
            warn!(name = %name, failures = keys.iter().filter(|k| k.is_failure()).count(), "Save failed; profile not recorded");
            return Ok(SaveReport {
                status,
                profile_name: name,
                folder_id: None,
                replaced: None,
                keys,
            });
        }

        profile.included_key_files = Some(exported);
        if let Err(e) = self.swap_in(&profile, existing.as_ref()) {
            remove_dir_best_effort(&dir);
            return Err(e);
        }
        if let Some(old) = &existing {
            remove_dir_best_effort(&self.ctx.paths.profile_dir(&old.folder_id));
        }

        info!(name = %profile.name, folder_id = %profile.folder_id, "Profile saved");
        Ok(SaveReport {
            status,
            profile_name: profile.name,
            folder_id: Some(profile.folder_id),
            replaced: existing.map(|p| p.folder_id),
            keys,
        })
    }

    /// Replace `old` by `new` in the catalog and persist; on failure the
    /// in-memory catalog is restored.
    fn swap_in(&mut self, new: &Profile, old: Option<&Profile>) -> Result<()> {
        if let Some(old) = old {
            self.ctx.profiles.remove(&old.folder_id)?;
        }
        let result = self
            .ctx
            .profiles
            .add(new.clone())
            .and_then(|()| self.ctx.profiles.persist());

        if result.is_err() {
            let _ = self.ctx.profiles.remove(&new.folder_id);
            if let Some(old) = old {
                let _ = self.ctx.profiles.add(old.clone());
            }
        }
        result
    }

    /// Import a profile's snapshots over the live keys.
    ///
    /// Live keys are backed up before they are overwritten. Snapshot files
    /// matching no managed key are reported as orphans and imported only
    /// if `orphans` allows it.
    #[instrument(skip(self, prompter))]
    pub fn load_profile(
        &self,
        name_or_id: &str,
        orphans: OrphanPolicy,
        prompter: &mut dyn Prompter,
    ) -> Result<LoadReport> {
        let profile = self.find_profile(name_or_id)?.clone();
        let dir = self.ctx.paths.profile_dir(&profile.folder_id);
        if !dir.is_dir() {
            return Err(RsError::DataDirMissing {
                name: profile.name,
                path: dir.display().to_string(),
            });
        }

        let present = snapshot_files(&dir)?;
        let file_set = profile
            .included_key_files
            .clone()
            .unwrap_or_else(|| present.clone());

        let mut attempted: Vec<String> = Vec::new();
        let mut keys = Vec::new();
        for key in self.config().managed_keys.clone() {
            if !contains_file(&file_set, &key.file_name) {
                continue;
            }
            attempted.push(key.file_name.clone());

            let backup = if self.registry.exists(&key.path) {
                self.backup_quietly(&key.path, &key.key_identifier())
            } else {
                None
            };
            let action = self.import_file(&dir.join(&key.file_name));
            keys.push(KeyOutcome::for_key(&key, action).with_backup(backup.as_deref()));
        }

        let orphaned: Vec<String> = present
            .into_iter()
            .filter(|f| !contains_file(&attempted, f))
            .filter(|f| self.ctx.config.definition_for_file(f).is_none())
            .collect();

        let mut orphan_imports = Vec::new();
        if !orphaned.is_empty() {
            info!(count = orphaned.len(), files = ?orphaned, "Orphaned snapshot files found");
            let accept = match orphans {
                OrphanPolicy::Import => true,
                OrphanPolicy::Skip => false,
                OrphanPolicy::Ask => prompter.confirm(&format!(
                    "{} orphaned file(s) match no managed key: {}. Import them?",
                    orphaned.len(),
                    orphaned.join(", ")
                )),
            };
            if accept {
                for file in &orphaned {
                    orphan_imports.push(self.import_orphan(&dir, file));
                }
            }
        }

        let status = if keys.is_empty() && orphan_imports.is_empty() {
            OverallStatus::NothingToDo
        } else {
            OverallStatus::from_outcomes(keys.iter().chain(&orphan_imports))
        };
        info!(name = %profile.name, status = status.label(), "Profile loaded");
        Ok(LoadReport {
            status,
            profile_name: profile.name,
            folder_id: profile.folder_id,
            keys,
            orphaned,
            orphan_imports,
        })
    }

    /// The live path comes from the file's own key header; without one
    /// the import still runs but nothing is backed up.
    fn import_orphan(&self, dir: &Path, file: &str) -> KeyOutcome {
        let src = dir.join(file);
        let live_path = first_key_path(&src);
        let backup = match &live_path {
            Some(path) if self.registry.exists(path) => {
                self.backup_quietly(path, &key_identifier(file))
            }
            Some(_) => None,
            None => {
                debug!(file, "Orphan has no key header; importing without backup");
                None
            }
        };
        let action = self.import_file(&src);
        KeyOutcome::for_orphan(file, live_path, action).with_backup(backup.as_deref())
    }

    fn import_file(&self, src: &Path) -> KeyAction {
        match self.registry.import(src) {
            Ok(()) => KeyAction::Imported,
            Err(e) => {
                warn!(file = %src.display(), error = %e, "Import failed");
                KeyAction::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn backup_key(&self, path: &str, identifier: &str) -> Result<PathBuf> {
        self.ctx
            .backups
            .backup(identifier, |dest| self.registry.export(path, dest))
    }

    /// Backup whose failure must not block the caller.
    fn backup_quietly(&self, path: &str, identifier: &str) -> Option<PathBuf> {
        self.backup_key(path, identifier)
            .inspect_err(|e| warn!(key = path, error = %e, "Backup failed; continuing"))
            .ok()
    }

    /// Delete every included live key, backing each up first.
    ///
    /// With `save_as`, a save runs first; its outcome does not stop the
    /// delete, which is confirmed separately.
    #[instrument(skip(self, prompter))]
    pub fn delete_live_keys(
        &mut self,
        save_as: Option<&str>,
        prompter: &mut dyn Prompter,
    ) -> Result<DeleteReport> {
        let save = match save_as {
            Some(name) => Some(self.save_profile(name, prompter)?),
            None => None,
        };

        let included = self.ctx.config.included_keys();
        if included.is_empty() {
            info!("No keys included; nothing to delete");
            return Ok(DeleteReport {
                status: OverallStatus::NothingToDo,
                save,
                keys: Vec::new(),
            });
        }

        let question = format!(
            "Delete {} live registry key(s)? Each is backed up first.",
            included.len()
        );
        if !prompter.confirm(&question) {
            info!("Delete cancelled");
            return Ok(DeleteReport {
                status: OverallStatus::Cancelled,
                save,
                keys: Vec::new(),
            });
        }

        let mut keys = Vec::new();
        for key in &included {
            if !self.registry.exists(&key.path) {
                keys.push(KeyOutcome::for_key(key, KeyAction::SkippedAbsent));
                continue;
            }
            // No delete without a backup to restore from
            let backup = match self.backup_key(&key.path, &key.key_identifier()) {
                Ok(path) => path,
                Err(e) => {
                    warn!(key = %key.path, error = %e, "Backup failed; key not deleted");
                    keys.push(KeyOutcome::for_key(
                        key,
                        KeyAction::Failed {
                            error: format!("backup failed: {e}"),
                        },
                    ));
                    continue;
                }
            };
            let action = match self.registry.delete(&key.path) {
                Ok(()) => KeyAction::Deleted,
                Err(e) => {
                    warn!(key = %key.path, error = %e, "Delete failed");
                    KeyAction::Failed {
                        error: e.to_string(),
                    }
                }
            };
            keys.push(KeyOutcome::for_key(key, action).with_backup(Some(&backup)));
        }

        let status = OverallStatus::from_outcomes(&keys);
        info!(status = status.label(), "Live keys deleted");
        Ok(DeleteReport { status, save, keys })
    }

    /// Rename a profile and persist the catalog.
    #[instrument(skip(self))]
    pub fn rename_profile(&mut self, name_or_id: &str, new_name: &str) -> Result<RenameOutcome> {
        let folder_id = self.find_profile(name_or_id)?.folder_id.clone();
        let outcome = self.ctx.profiles.rename(&folder_id, new_name)?;

        if let RenameOutcome::Renamed { from } = &outcome {
            if let Err(e) = self.ctx.profiles.persist() {
                let _ = self.ctx.profiles.rename(&folder_id, from);
                return Err(e);
            }
        }
        Ok(outcome)
    }

    /// Remove a profile's catalog entry, then its data directory.
    #[instrument(skip(self, prompter))]
    pub fn delete_profile(
        &mut self,
        name_or_id: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<RemoveReport> {
        let profile = self.find_profile(name_or_id)?.clone();

        if !prompter.confirm(&format!("Delete profile '{}'?", profile.name)) {
            info!(name = %profile.name, "Profile delete cancelled");
            return Ok(RemoveReport {
                status: OverallStatus::Cancelled,
                profile_name: profile.name,
                folder_id: profile.folder_id,
                directory_removed: false,
            });
        }

        let removed = self.ctx.profiles.remove(&profile.folder_id)?;
        if let Err(e) = self.ctx.profiles.persist() {
            let _ = self.ctx.profiles.add(removed);
            return Err(e);
        }

        let dir = self.ctx.paths.profile_dir(&profile.folder_id);
        let directory_removed = remove_dir_best_effort(&dir);
        info!(name = %profile.name, "Profile deleted");
        Ok(RemoveReport {
            status: OverallStatus::FullSuccess,
            profile_name: profile.name,
            folder_id: profile.folder_id,
            directory_removed,
        })
    }
}

/// Snapshot file names in `dir`, sorted.
fn snapshot_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_snapshot_file(&name) {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

fn contains_file(files: &[String], name: &str) -> bool {
    files.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// Returns true if the directory is gone afterwards.
fn remove_dir_best_effort(dir: &Path) -> bool {
    match fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not remove directory");
            false
        }
    }
}
