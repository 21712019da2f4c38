//! Application state for one run.
//!
//! Built once at startup from the resolved storage layout and handed to
//! the [`ProfileManager`](crate::manager::ProfileManager) by value.

use tracing::info;

use crate::backup::{BackupRotator, MAX_BACKUPS};
use crate::config::{ConfigStore, ManagedKeyDefinition, StoragePaths};
use crate::error::Result;
use crate::profile::ProfileStore;

/// Stores and layout shared by every workflow.
#[derive(Debug)]
pub struct AppContext {
    pub paths: StoragePaths,
    pub config: ConfigStore,
    pub profiles: ProfileStore,
    pub backups: BackupRotator,
}

impl AppContext {
    /// Create the storage directories, then load both catalogs.
    ///
    /// Only directory creation can fail; unreadable catalogs fall back to
    /// defaults.
    pub fn open(paths: StoragePaths, definitions: Vec<ManagedKeyDefinition>) -> Result<Self> {
        paths.ensure_dirs()?;

        let config = ConfigStore::load(paths.config_file(), definitions);
        let profiles = ProfileStore::load(paths.profiles_file());
        let backups = BackupRotator::new(paths.backups_dir(), MAX_BACKUPS);

        info!(
            base = %paths.base().display(),
            profiles = profiles.len(),
            "Application state ready"
        );
        Ok(Self {
            paths,
            config,
            profiles,
            backups,
        })
    }
}
