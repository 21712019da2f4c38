//! Managed-key definitions and the persisted configuration shape.
//!
//! Definitions are compiled in and authoritative for `path`, friendly name
//! and file name. Only `is_included` and the default profile name are user
//! data.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Profile name used when none is configured.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Extension of exported snapshot files.
pub const SNAPSHOT_EXTENSION: &str = "reg";

/// Static catalog entry for a registry subtree the tool knows how to snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedKeyDefinition {
    /// Registry subtree address (opaque to the core).
    pub path: String,
    /// Human-readable label.
    pub friendly_name: String,
    /// Stable snapshot file name, unique across definitions.
    pub file_name: String,
    pub included_by_default: bool,
}

impl ManagedKeyDefinition {
    #[must_use]
    pub fn new(path: &str, friendly_name: &str, file_name: &str, included_by_default: bool) -> Self {
        Self {
            path: path.to_string(),
            friendly_name: friendly_name.to_string(),
            file_name: file_name.to_string(),
            included_by_default,
        }
    }

    /// Initial state for this definition.
    #[must_use]
    pub fn default_state(&self) -> ManagedKeyState {
        ManagedKeyState {
            path: self.path.clone(),
            friendly_name: self.friendly_name.clone(),
            file_name: self.file_name.clone(),
            is_included: self.included_by_default,
        }
    }
}

/// Built-in managed keys.
#[must_use]
pub fn default_definitions() -> Vec<ManagedKeyDefinition> {
    vec![
        ManagedKeyDefinition::new(
            r"HKEY_CURRENT_USER\Software\Valve\Steam",
            "Steam client session",
            "steam.reg",
            true,
        ),
        ManagedKeyDefinition::new(
            r"HKEY_CURRENT_USER\Software\Riot Games",
            "Riot client settings",
            "riot_games.reg",
            true,
        ),
        ManagedKeyDefinition::new(
            r"HKEY_CURRENT_USER\Software\Blizzard Entertainment\Battle.net",
            "Battle.net launcher",
            "battle_net.reg",
            false,
        ),
        ManagedKeyDefinition::new(
            r"HKEY_CURRENT_USER\Software\Epic Games\Unreal Engine\Identifiers",
            "Epic account identifiers",
            "epic_identifiers.reg",
            false,
        ),
    ]
}

/// Persisted, user-toggleable state of one managed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedKeyState {
    pub path: String,
    #[serde(rename = "userFriendlyName")]
    pub friendly_name: String,
    pub is_included: bool,
    pub file_name: String,
}

impl ManagedKeyState {
    /// Backup identifier: the file name without its extension.
    #[must_use]
    pub fn key_identifier(&self) -> String {
        key_identifier(&self.file_name)
    }
}

/// Strip the extension from a snapshot file name.
#[must_use]
pub fn key_identifier(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().into_owned())
}

/// Returns true if `file_name` has the snapshot extension (case-insensitive).
#[must_use]
pub fn is_snapshot_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(SNAPSHOT_EXTENSION))
}

/// The full configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub default_profile_name: String,
    pub managed_keys: Vec<ManagedKeyState>,
}

impl Config {
    /// All keys at their default inclusion.
    #[must_use]
    pub fn from_definitions(definitions: &[ManagedKeyDefinition]) -> Self {
        Self {
            default_profile_name: DEFAULT_PROFILE_NAME.to_string(),
            managed_keys: definitions.iter().map(ManagedKeyDefinition::default_state).collect(),
        }
    }

    /// Keys currently marked for inclusion.
    pub fn included(&self) -> impl Iterator<Item = &ManagedKeyState> {
        self.managed_keys.iter().filter(|k| k.is_included)
    }

    /// Look up a key by path or file name (case-insensitive).
    #[must_use]
    pub fn find_key(&self, key: &str) -> Option<&ManagedKeyState> {
        self.managed_keys.iter().find(|k| {
            k.path.eq_ignore_ascii_case(key)
                || k.file_name.eq_ignore_ascii_case(key)
                || k.key_identifier().eq_ignore_ascii_case(key)
        })
    }
}

/// Loosely-typed shape of `config.json` as found on disk.
///
/// Every field is optional so older or hand-edited files still load; the
/// store validates and fills gaps from the definitions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersistedConfig {
    #[serde(default)]
    pub default_profile_name: Option<String>,
    #[serde(default)]
    pub managed_keys: Vec<PersistedKeyState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersistedKeyState {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub is_included: Option<bool>,
}
