//! Storage layout and base-directory resolution.
//!
//! Everything lives under one user-scoped base directory:
//!
//! ```text
//! <base>/
//! ├── config.json
//! ├── profiles.json
//! ├── profile_data/
//! │   └── <folderId>/<fileName>.reg
//! └── backups/
//!     └── <keyIdentifier>_backup_<yyyyMMddHHmmss>.reg
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::error::{Result, RsError};

/// Directory name under the platform data directory.
pub const APP_DIR: &str = "regswap";
pub const CONFIG_FILE: &str = "config.json";
pub const PROFILES_FILE: &str = "profiles.json";
pub const PROFILE_DATA_DIR: &str = "profile_data";
pub const BACKUPS_DIR: &str = "backups";

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "REGSWAP_HOME";

/// Resolved paths of the persisted layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    base: PathBuf,
}

impl StoragePaths {
    /// Layout rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Layout rooted at the default location, or at `override_dir` if given.
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self> {
        let base = match override_dir {
            Some(dir) => expand_home(dir)?,
            None => default_base_dir()?,
        };
        debug!(base = %base.display(), "Resolved storage base directory");
        Ok(Self::new(base))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join(CONFIG_FILE)
    }

    pub fn profiles_file(&self) -> PathBuf {
        self.base.join(PROFILES_FILE)
    }

    pub fn profile_data_dir(&self) -> PathBuf {
        self.base.join(PROFILE_DATA_DIR)
    }

    /// Snapshot directory owned by one profile.
    pub fn profile_dir(&self, folder_id: &str) -> PathBuf {
        self.profile_data_dir().join(folder_id)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.base.join(BACKUPS_DIR)
    }

    /// Create the base, profile data and backup directories.
    ///
    /// This is the one failure that stops startup.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.base.clone(), self.profile_data_dir(), self.backups_dir()] {
            trace!(dir = %dir.display(), "Ensuring directory");
            std::fs::create_dir_all(&dir).map_err(|e| RsError::StorageInit {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        info!(base = %self.base.display(), "Storage directories ready");
        Ok(())
    }
}

/// Default base directory: `<data_local_dir>/regswap`.
pub fn default_base_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| {
        RsError::Other("Could not determine local data directory".to_string())
    })?;
    Ok(data_dir.join(APP_DIR))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_string_lossy();
    if path_str == "~" || path_str.starts_with("~/") || path_str.starts_with("~\\") {
        let home = home_dir()?;
        let rest = path_str[1..].trim_start_matches(['/', '\\']);
        let resolved = if rest.is_empty() { home } else { home.join(rest) };
        debug!(
            original = %path.display(),
            resolved = %resolved.display(),
            "Expanded home directory path"
        );
        return Ok(resolved);
    }
    Ok(path.to_path_buf())
}

/// Resolve the user's home directory (cross-platform).
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| RsError::Other("Could not determine home directory".to_string()))
}
