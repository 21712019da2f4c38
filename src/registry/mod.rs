//! Registry snapshot abstraction.
//!
//! This module provides a trait over the external tool that exports,
//! imports, queries and deletes registry subtrees, with a real
//! implementation driving `reg.exe` and an in-memory mock for tests.

pub mod mock;
mod reg_file;
mod reg_tool;

pub use reg_file::{REG_FILE_HEADER, first_key_path, read_reg_text};
pub use reg_tool::{DEFAULT_TOOL_TIMEOUT, RegTool, run_with_timeout};

use std::path::Path;

use crate::error::Result;

/// Core registry operations.
///
/// Implementations block until the underlying tool finishes or times out.
pub trait RegistrySnapshotter {
    /// Check whether the subtree at `path` currently exists.
    ///
    /// Tool failures are logged and reported as "absent".
    fn exists(&self, path: &str) -> bool;

    /// Export the subtree at `path` into `dest`, overwriting it.
    ///
    /// # Errors
    ///
    /// `ExportFailed` if the key is absent or the tool exits non-zero,
    /// `ToolTimeout` if it does not finish in time.
    fn export(&self, path: &str, dest: &Path) -> Result<()>;

    /// Import a snapshot file into the live registry.
    ///
    /// # Errors
    ///
    /// `ImportFailed` if the file is missing or the tool exits non-zero,
    /// `ToolTimeout` if it does not finish in time.
    fn import(&self, src: &Path) -> Result<()>;

    /// Delete the subtree at `path`.
    ///
    /// Best effort; callers log the error and carry on.
    fn delete(&self, path: &str) -> Result<()>;
}

/// Type alias for boxed trait object.
pub type BoxedRegistry = Box<dyn RegistrySnapshotter>;

/// Shared handles forward to the inner implementation, so a test can keep
/// an `Arc<MockRegistry>` for assertions after handing a clone away.
impl<T: RegistrySnapshotter + ?Sized> RegistrySnapshotter for std::sync::Arc<T> {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn export(&self, path: &str, dest: &Path) -> Result<()> {
        (**self).export(path, dest)
    }

    fn import(&self, src: &Path) -> Result<()> {
        (**self).import(src)
    }

    fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path)
    }
}
