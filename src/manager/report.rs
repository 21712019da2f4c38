//! Per-key and overall results of multi-key workflows.
//!
//! Every report serializes as-is for robot output.

use std::path::Path;

use serde::Serialize;

use crate::config::ManagedKeyState;

/// Overall result of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    FullSuccess,
    PartialSuccess,
    Cancelled,
    NothingToDo,
}

impl OverallStatus {
    /// `FullSuccess` unless any outcome failed.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a KeyOutcome>) -> Self {
        if outcomes.into_iter().any(KeyOutcome::is_failure) {
            Self::PartialSuccess
        } else {
            Self::FullSuccess
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FullSuccess => "success",
            Self::PartialSuccess => "partial success",
            Self::Cancelled => "cancelled",
            Self::NothingToDo => "nothing to do",
        }
    }
}

/// What happened to one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum KeyAction {
    Exported,
    Imported,
    Deleted,
    /// The live key does not exist.
    SkippedAbsent,
    Failed { error: String },
}

/// Result for one managed key or orphaned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyOutcome {
    pub label: String,
    pub file_name: String,
    /// Live registry path; unknown for orphans without a key header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub action: KeyAction,
    /// Safety backup written before a destructive step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

impl KeyOutcome {
    pub fn for_key(key: &ManagedKeyState, action: KeyAction) -> Self {
        Self {
            label: key.friendly_name.clone(),
            file_name: key.file_name.clone(),
            path: Some(key.path.clone()),
            action,
            backup: None,
        }
    }

    pub fn for_orphan(file_name: &str, path: Option<String>, action: KeyAction) -> Self {
        Self {
            label: file_name.to_string(),
            file_name: file_name.to_string(),
            path,
            action,
            backup: None,
        }
    }

    #[must_use]
    pub fn with_backup(mut self, backup: Option<&Path>) -> Self {
        self.backup = backup.map(|p| p.display().to_string());
        self
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self.action, KeyAction::Failed { .. })
    }
}

/// Result of saving a profile.
#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub status: OverallStatus,
    pub profile_name: String,
    /// Set only when the profile was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Folder id of the profile this save replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<String>,
    pub keys: Vec<KeyOutcome>,
}

impl SaveReport {
    pub(crate) fn cancelled(profile_name: &str) -> Self {
        Self {
            status: OverallStatus::Cancelled,
            profile_name: profile_name.to_string(),
            folder_id: None,
            replaced: None,
            keys: Vec::new(),
        }
    }

    pub fn failures(&self) -> usize {
        self.keys.iter().filter(|k| k.is_failure()).count()
    }
}

/// Result of loading a profile.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub status: OverallStatus,
    pub profile_name: String,
    pub folder_id: String,
    pub keys: Vec<KeyOutcome>,
    /// Snapshot files matching no managed key.
    pub orphaned: Vec<String>,
    /// Results for orphans the caller chose to import.
    pub orphan_imports: Vec<KeyOutcome>,
}

impl LoadReport {
    pub fn failures(&self) -> usize {
        self.keys
            .iter()
            .chain(&self.orphan_imports)
            .filter(|k| k.is_failure())
            .count()
    }
}

/// Result of deleting the live keys.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub status: OverallStatus,
    /// The save that ran first, if one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<SaveReport>,
    pub keys: Vec<KeyOutcome>,
}

/// Result of deleting a saved profile.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveReport {
    pub status: OverallStatus,
    pub profile_name: String,
    pub folder_id: String,
    pub directory_removed: bool,
}
