//! Atomic file replacement for the persisted catalogs.
//!
//! Content is written to a temp file in the target's directory, synced, and
//! renamed over the target, so readers never observe a half-written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{trace, warn};

use crate::error::{Result, ResultExt, RsError};

/// Write `content` to `target` atomically.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let parent = target.parent().ok_or_else(|| {
        RsError::Other(format!(
            "Target path has no parent directory: {}",
            target.display()
        ))
    })?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let temp_path = temp_path_for(target);
    trace!(target = %target.display(), temp = %temp_path.display(), "Writing atomically");

    let write_result = (|| -> Result<()> {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("Failed to write temp file {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync temp file {}", temp_path.display()))?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, target).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        RsError::Other(format!(
            "Failed to rename {} to {}: {e}",
            temp_path.display(),
            target.display()
        ))
    })
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(target, json.as_bytes())
}

/// Keep a copy of an unreadable file next to it before it gets overwritten.
///
/// Returns the path of the copy, or `None` if copying failed.
pub fn preserve_corrupt(path: &Path) -> Option<PathBuf> {
    let mut name = path.file_name()?.to_os_string();
    name.push(".corrupt");
    let copy = path.with_file_name(name);
    match fs::copy(path, &copy) {
        Ok(_) => Some(copy),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not preserve unreadable file");
            None
        }
    }
}

fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy().into_owned());
    target.with_file_name(format!(".{name}.tmp-{}", std::process::id()))
}
