//! Error types for registry profile operations.

use thiserror::Error;

/// Primary error type for regswap operations.
#[derive(Error, Debug)]
pub enum RsError {
    // Persisted state
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Profile catalog parse error: {0}")]
    CatalogParse(String),

    #[error("Failed to create storage directory {path}: {reason}")]
    StorageInit { path: String, reason: String },

    // Registry tool
    #[error("Export of '{key}' failed: {reason}")]
    ExportFailed { key: String, reason: String },

    #[error("Import of '{file}' failed: {reason}")]
    ImportFailed { file: String, reason: String },

    #[error("Delete of '{key}' failed: {reason}")]
    DeleteFailed { key: String, reason: String },

    #[error("Registry tool timed out after {secs}s: {command}")]
    ToolTimeout { command: String, secs: u64 },

    #[error("Failed to start registry tool '{program}': {reason}")]
    ToolSpawn { program: String, reason: String },

    // Catalog
    #[error("A profile named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("Data directory for profile '{name}' is missing: {path}")]
    DataDirMissing { name: String, path: String },

    #[error("Managed key not found: {key}")]
    KeyNotFound { key: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl RsError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName { .. }
                | Self::InvalidName(_)
                | Self::ProfileNotFound { .. }
                | Self::DataDirMissing { .. }
                | Self::KeyNotFound { .. }
                | Self::ToolTimeout { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DuplicateName { .. } => Some("Pick another name or confirm the overwrite"),
            Self::ProfileNotFound { .. } => Some("Run: regswap list"),
            Self::DataDirMissing { .. } => Some("Delete the stale profile and save it again"),
            Self::KeyNotFound { .. } => Some("Run: regswap keys"),
            Self::ToolTimeout { .. } => Some("Increase --tool-timeout or retry"),
            Self::ToolSpawn { .. } => Some("Ensure reg.exe is on PATH (Windows only)"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using RsError.
pub type Result<T> = std::result::Result<T, RsError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| RsError::Other(format!("{}: {e}", f().into())))
    }
}
