//! Output mode abstraction for robot and human output.

use serde::Serialize;

use crate::cli::Cli;
use crate::config::ManagedKeyState;
use crate::error::RsError;
use crate::manager::{DeleteReport, LoadReport, RemoveReport, SaveReport};
use crate::profile::{Profile, RenameOutcome};

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// Retained backups of one key identifier.
#[derive(Debug, Clone, Serialize)]
pub struct BackupListing {
    pub key_identifier: String,
    /// File names, oldest first.
    pub files: Vec<String>,
}

/// Build information shown by `version`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: bool,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
    pub target: &'static str,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for AI agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { color: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human {
                color: !cli.no_color,
            }
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color } => Box::new(HumanOutput::new(color)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &RsError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Catalogs
    fn profile_list(&self, profiles: &[Profile]);
    fn key_list(&self, keys: &[ManagedKeyState]);
    fn backup_list(&self, listings: &[BackupListing]);

    // Workflows
    fn save_report(&self, report: &SaveReport);
    fn load_report(&self, report: &LoadReport);
    fn delete_report(&self, report: &DeleteReport);
    fn remove_report(&self, report: &RemoveReport);
    fn rename_result(&self, profile: &str, new_name: &str, outcome: &RenameOutcome);

    // Configuration
    fn inclusion_changed(&self, key: &ManagedKeyState);
    fn default_name_set(&self, name: &str);

    // Version info
    fn version_info(&self, info: &VersionInfo);
}
