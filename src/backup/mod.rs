//! Retention-capped safety backups of live keys.
//!
//! A backup is written right before a destructive operation on a key. Files
//! live flat in one directory:
//!
//! ```text
//! backups/<keyIdentifier>_backup_<yyyyMMddHHmmss>.reg
//! ```
//!
//! After every successful backup the identifier's files are pruned down to
//! the cap, oldest first.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, RsError};

/// Backups retained per key identifier.
pub const MAX_BACKUPS: usize = 10;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Writes and prunes backups in one directory.
#[derive(Debug, Clone)]
pub struct BackupRotator {
    dir: PathBuf,
    max_backups: usize,
}

impl BackupRotator {
    pub fn new(dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            dir: dir.into(),
            max_backups,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Back up `key_identifier` now; see [`Self::backup_at`].
    pub fn backup<F>(&self, key_identifier: &str, export_fn: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        self.backup_at(key_identifier, Utc::now(), export_fn)
    }

    /// Call `export_fn` with the backup path for `timestamp`, then prune.
    ///
    /// If a backup with that timestamp already exists the timestamp moves
    /// forward a second at a time until the name is free. A failed export
    /// leaves no partial file behind and skips pruning.
    #[instrument(skip(self, export_fn))]
    pub fn backup_at<F>(
        &self,
        key_identifier: &str,
        timestamp: DateTime<Utc>,
        export_fn: F,
    ) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        fs::create_dir_all(&self.dir)?;
        let mut timestamp = timestamp;
        let mut path = self.dir.join(backup_file_name(key_identifier, timestamp));
        while path.exists() {
            timestamp += Duration::seconds(1);
            path = self.dir.join(backup_file_name(key_identifier, timestamp));
        }

        if let Err(e) = export_fn(&path) {
            let _ = fs::remove_file(&path);
            warn!(key = key_identifier, error = %e, "Backup failed");
            return Err(e);
        }
        info!(key = key_identifier, path = %path.display(), "Backup written");

        let removed = self.prune(key_identifier);
        if removed > 0 {
            debug!(key = key_identifier, removed, "Pruned old backups");
        }
        Ok(path)
    }

    /// Delete the oldest backups of `key_identifier` beyond the cap.
    ///
    /// Returns the number of files deleted. Deletion failures are logged.
    #[instrument(skip(self))]
    pub fn prune(&self, key_identifier: &str) -> usize {
        let backups = match self.sorted_backups(key_identifier) {
            Ok(backups) => backups,
            Err(e) => {
                warn!(key = key_identifier, error = %e, "Could not list backups");
                return 0;
            }
        };
        if backups.len() <= self.max_backups {
            return 0;
        }

        let excess = backups.len() - self.max_backups;
        let mut removed = 0;
        for path in &backups[..excess] {
            match fs::remove_file(path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Deleted old backup");
                    removed += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Could not delete old backup"),
            }
        }
        removed
    }

    /// Retained backups of `key_identifier`, oldest first.
    pub fn list(&self, key_identifier: &str) -> Result<Vec<PathBuf>> {
        self.sorted_backups(key_identifier)
    }

    fn sorted_backups(&self, key_identifier: &str) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let pattern = backup_pattern(key_identifier)?;

        let mut entries: Vec<(SystemTime, String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !pattern.is_match(&name) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((created, name, entry.path()));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        Ok(entries.into_iter().map(|(_, _, path)| path).collect())
    }
}

/// `<id>_backup_<yyyyMMddHHmmss>.reg`
#[must_use]
pub fn backup_file_name(key_identifier: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{key_identifier}_backup_{}.reg",
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

fn backup_pattern(key_identifier: &str) -> Result<Regex> {
    let pattern = format!(r"^{}_backup_\d{{14}}\.reg$", regex::escape(key_identifier));
    Regex::new(&pattern).map_err(|e| RsError::Other(format!("Invalid backup pattern: {e}")))
}
