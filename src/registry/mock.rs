//! Mock registry implementation for unit testing.
//!
//! This module provides an in-memory registry that records all operations
//! and supports failure injection, so profile workflows can be tested
//! without Windows.
//!
//! # Example
//!
//! ```rust,ignore
//! use regswap::registry::mock::{MockRegistry, Operation};
//! use regswap::registry::RegistrySnapshotter;
//!
//! let mock = MockRegistry::new().with_key(r"HKCU\Software\A", "\"v\"=\"1\"");
//!
//! mock.export(r"HKCU\Software\A", &dest).unwrap();
//!
//! mock.assert_contains(&Operation::Export {
//!     path: r"HKCU\Software\A".to_string(),
//!     dest: dest.display().to_string(),
//! });
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, trace};

use super::RegistrySnapshotter;
use super::reg_file::{REG_FILE_HEADER, first_key_path, read_reg_text};
use crate::error::{Result, RsError};

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Exists { path: String },
    Export { path: String, dest: String },
    Import { src: String },
    Delete { path: String },
}

/// Failure injection settings.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Keys whose export fails.
    pub failing_exports: HashSet<String>,
    /// Snapshot file names whose import fails.
    pub failing_imports: HashSet<String>,
    /// Keys whose delete fails.
    pub failing_deletes: HashSet<String>,
    /// Keys whose operations time out.
    pub timing_out: HashSet<String>,
}

/// In-memory registry keyed by subtree path.
///
/// Values are the body text written after the `[KEY]` header on export.
#[derive(Debug, Default)]
pub struct MockRegistry {
    keys: Mutex<BTreeMap<String, String>>,
    operation_log: Mutex<Vec<Operation>>,
    config: MockConfig,
}

impl MockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a live key.
    #[must_use]
    pub fn with_key(self, path: &str, body: &str) -> Self {
        self.set_key(path, body);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn failing_export(mut self, path: &str) -> Self {
        self.config.failing_exports.insert(path.to_string());
        self
    }

    #[must_use]
    pub fn failing_import(mut self, file_name: &str) -> Self {
        self.config.failing_imports.insert(file_name.to_string());
        self
    }

    #[must_use]
    pub fn failing_delete(mut self, path: &str) -> Self {
        self.config.failing_deletes.insert(path.to_string());
        self
    }

    #[must_use]
    pub fn timing_out(mut self, path: &str) -> Self {
        self.config.timing_out.insert(path.to_string());
        self
    }

    // === State ===

    pub fn set_key(&self, path: &str, body: &str) {
        self.keys
            .lock()
            .unwrap()
            .insert(path.to_string(), body.to_string());
    }

    pub fn remove_key(&self, path: &str) {
        self.keys.lock().unwrap().remove(path);
    }

    /// Body of a live key.
    #[must_use]
    pub fn key(&self, path: &str) -> Option<String> {
        self.keys.lock().unwrap().get(path).cloned()
    }

    #[must_use]
    pub fn has_key(&self, path: &str) -> bool {
        self.keys.lock().unwrap().contains_key(path)
    }

    #[must_use]
    pub fn key_paths(&self) -> Vec<String> {
        self.keys.lock().unwrap().keys().cloned().collect()
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Operations other than existence checks.
    #[must_use]
    pub fn mutations(&self) -> Vec<Operation> {
        self.operations()
            .into_iter()
            .filter(|op| !matches!(op, Operation::Exists { .. }))
            .collect()
    }

    /// Imported file names, in order.
    #[must_use]
    pub fn imported_files(&self) -> Vec<String> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Import { src } => Path::new(&src)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Assert nothing was exported, imported or deleted.
    ///
    /// # Panics
    ///
    /// Panics if any mutating operation was recorded.
    pub fn assert_no_mutations(&self) {
        let ops = self.mutations();
        assert!(ops.is_empty(), "Expected no mutations, but found: {ops:#?}");
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
    }

    fn check_timeout(&self, path: &str, command: &str) -> Result<()> {
        if self.config.timing_out.contains(path) {
            return Err(RsError::ToolTimeout {
                command: format!("reg {command} {path}"),
                secs: 0,
            });
        }
        Ok(())
    }
}

impl RegistrySnapshotter for MockRegistry {
    fn exists(&self, path: &str) -> bool {
        self.record_op(Operation::Exists {
            path: path.to_string(),
        });
        self.keys.lock().unwrap().contains_key(path)
    }

    fn export(&self, path: &str, dest: &Path) -> Result<()> {
        self.record_op(Operation::Export {
            path: path.to_string(),
            dest: dest.display().to_string(),
        });
        self.check_timeout(path, "export")?;

        if self.config.failing_exports.contains(path) {
            return Err(RsError::ExportFailed {
                key: path.to_string(),
                reason: "mock export configured to fail".to_string(),
            });
        }
        let body = self.key(path).ok_or_else(|| RsError::ExportFailed {
            key: path.to_string(),
            reason: "key not found".to_string(),
        })?;

        let content = format!("{REG_FILE_HEADER}\r\n\r\n[{path}]\r\n{body}\r\n");
        std::fs::write(dest, content).map_err(|e| RsError::ExportFailed {
            key: path.to_string(),
            reason: e.to_string(),
        })?;
        debug!(key = path, dest = %dest.display(), "Mock export");
        Ok(())
    }

    fn import(&self, src: &Path) -> Result<()> {
        self.record_op(Operation::Import {
            src: src.display().to_string(),
        });

        let file_name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fail = |reason: &str| RsError::ImportFailed {
            file: src.display().to_string(),
            reason: reason.to_string(),
        };

        if self.config.failing_imports.contains(&file_name) {
            return Err(fail("mock import configured to fail"));
        }
        if !src.is_file() {
            return Err(fail("file not found"));
        }

        let path = first_key_path(src).ok_or_else(|| fail("no registry key header"))?;
        self.check_timeout(&path, "import")?;

        let text = read_reg_text(src)?;
        let header = format!("[{path}]");
        let body = text
            .split_once(&header)
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default();
        self.set_key(&path, &body);
        debug!(key = %path, src = %src.display(), "Mock import");
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.record_op(Operation::Delete {
            path: path.to_string(),
        });
        self.check_timeout(path, "delete")?;

        if self.config.failing_deletes.contains(path) {
            return Err(RsError::DeleteFailed {
                key: path.to_string(),
                reason: "mock delete configured to fail".to_string(),
            });
        }
        self.remove_key(path);
        Ok(())
    }
}
