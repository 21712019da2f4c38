//! Human-friendly output implementation using console.

use console::Term;
use tracing::{debug, instrument, trace};

use crate::config::ManagedKeyState;
use crate::error::RsError;
use crate::manager::{
    DeleteReport, KeyAction, KeyOutcome, LoadReport, OverallStatus, RemoveReport, SaveReport,
};
use crate::profile::{Profile, RenameOutcome};
use crate::theme::Theme;

use super::{BackupListing, Output, VersionInfo};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    out: Term,
    err: Term,
    theme: Theme,
}

impl HumanOutput {
    #[instrument]
    pub fn new(color: bool) -> Self {
        debug!("Creating HumanOutput");
        if !color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme: Theme::default(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.out.write_line(text);
    }

    fn header(&self, title: &str) {
        self.line(&self.theme.header.apply_to(title).to_string());
    }

    fn status_line(&self, verb: &str, status: OverallStatus) {
        let tag = match status {
            OverallStatus::FullSuccess => self.theme.success.apply_to("[OK]"),
            OverallStatus::PartialSuccess => self.theme.error.apply_to("[PARTIAL]"),
            OverallStatus::Cancelled => self.theme.warning.apply_to("[CANCELLED]"),
            OverallStatus::NothingToDo => self.theme.info.apply_to("[NOTHING]"),
        };
        self.line(&format!("{tag} {verb}: {}", status.label()));
    }

    fn outcome_line(&self, outcome: &KeyOutcome) {
        let (mark, detail) = match &outcome.action {
            KeyAction::Exported => (self.theme.success.apply_to("  +"), "exported".to_string()),
            KeyAction::Imported => (self.theme.success.apply_to("  +"), "imported".to_string()),
            KeyAction::Deleted => (self.theme.success.apply_to("  -"), "deleted".to_string()),
            KeyAction::SkippedAbsent => (
                self.theme.muted.apply_to("  ."),
                "skipped (not present)".to_string(),
            ),
            KeyAction::Failed { error } => {
                (self.theme.error.apply_to("  x"), format!("failed: {error}"))
            }
        };
        self.line(&format!(
            "{mark} {} {}",
            self.theme.value.apply_to(&outcome.label),
            detail
        ));
        if let Some(backup) = &outcome.backup {
            trace!(backup, "Showing backup path");
            self.line(&format!(
                "      {} {}",
                self.theme.label.apply_to("backup"),
                self.theme.muted.apply_to(backup)
            ));
        }
    }
}

impl Output for HumanOutput {
    #[instrument(skip(self))]
    fn success(&self, message: &str) {
        debug!(message, "Outputting success");
        self.line(&format!("{} {message}", self.theme.success.apply_to("[OK]")));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &RsError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        let _ = self
            .err
            .write_line(&format!("{} {error}", self.theme.error.apply_to("[ERR]")));
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            let _ = self.err.write_line(&format!(
                "      {} {}",
                self.theme.label.apply_to("Suggestion:"),
                self.theme.muted.apply_to(suggestion)
            ));
        }
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        debug!(message, "Outputting warning");
        self.line(&format!("{} {message}", self.theme.warning.apply_to("[WARN]")));
    }

    #[instrument(skip(self))]
    fn info(&self, message: &str) {
        debug!(message, "Outputting info");
        self.line(&format!("{} {message}", self.theme.info.apply_to("[INFO]")));
    }

    #[instrument(skip(self, profiles), fields(count = profiles.len()))]
    fn profile_list(&self, profiles: &[Profile]) {
        if profiles.is_empty() {
            self.warning("No saved profiles");
            return;
        }
        self.header("Saved profiles:");
        for (idx, profile) in profiles.iter().enumerate() {
            let files = profile.included_key_files.as_ref().map_or_else(
                || "all files".to_string(),
                |files| format!("{} file(s)", files.len()),
            );
            self.line(&format!(
                "  {:>2}. {}  {}  {}",
                idx + 1,
                self.theme.profile_name.apply_to(&profile.name),
                self.theme.muted.apply_to(profile.creation_timestamp.format("%Y-%m-%d %H:%M UTC")),
                self.theme.label.apply_to(files),
            ));
        }
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    fn key_list(&self, keys: &[ManagedKeyState]) {
        self.header("Managed keys:");
        for (idx, key) in keys.iter().enumerate() {
            let mark = if key.is_included {
                self.theme.included.apply_to("[x]")
            } else {
                self.theme.excluded.apply_to("[ ]")
            };
            self.line(&format!(
                "  {:>2}. {mark} {} ({})",
                idx + 1,
                self.theme.value.apply_to(&key.friendly_name),
                key.file_name
            ));
            self.line(&format!("         {}", self.theme.key_path.apply_to(&key.path)));
        }
    }

    #[instrument(skip(self, listings), fields(count = listings.len()))]
    fn backup_list(&self, listings: &[BackupListing]) {
        if listings.iter().all(|l| l.files.is_empty()) {
            self.info("No backups yet");
            return;
        }
        for listing in listings.iter().filter(|l| !l.files.is_empty()) {
            self.header(&format!("{} ({})", listing.key_identifier, listing.files.len()));
            for file in &listing.files {
                self.line(&format!("  {file}"));
            }
        }
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn save_report(&self, report: &SaveReport) {
        for outcome in &report.keys {
            self.outcome_line(outcome);
        }
        self.status_line(&format!("Save '{}'", report.profile_name), report.status);
        if report.status == OverallStatus::PartialSuccess {
            self.warning("Profile was not recorded; the previous state is unchanged");
        }
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn load_report(&self, report: &LoadReport) {
        for outcome in &report.keys {
            self.outcome_line(outcome);
        }
        if !report.orphaned.is_empty() {
            self.warning(&format!(
                "Orphaned file(s): {}",
                report.orphaned.join(", ")
            ));
            for outcome in &report.orphan_imports {
                self.outcome_line(outcome);
            }
        }
        self.status_line(&format!("Load '{}'", report.profile_name), report.status);
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn delete_report(&self, report: &DeleteReport) {
        if let Some(save) = &report.save {
            self.save_report(save);
        }
        for outcome in &report.keys {
            self.outcome_line(outcome);
        }
        self.status_line("Delete live keys", report.status);
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn remove_report(&self, report: &RemoveReport) {
        match report.status {
            OverallStatus::Cancelled => self.warning("Delete cancelled"),
            _ => {
                self.success(&format!("Profile '{}' deleted", report.profile_name));
                if !report.directory_removed {
                    self.warning("Snapshot directory could not be removed");
                }
            }
        }
    }

    #[instrument(skip(self))]
    fn rename_result(&self, profile: &str, new_name: &str, outcome: &RenameOutcome) {
        match outcome {
            RenameOutcome::Renamed { from } => {
                self.success(&format!("Renamed '{from}' to '{new_name}'"));
            }
            RenameOutcome::Unchanged => {
                self.warning(&format!("'{profile}' already has that name; nothing changed"));
            }
        }
    }

    #[instrument(skip(self, key), fields(key = %key.path))]
    fn inclusion_changed(&self, key: &ManagedKeyState) {
        let state = if key.is_included { "included" } else { "excluded" };
        self.success(&format!("{} {state}", key.friendly_name));
    }

    #[instrument(skip(self))]
    fn default_name_set(&self, name: &str) {
        self.success(&format!("Default profile name set to '{name}'"));
    }

    #[instrument(skip(self, info))]
    fn version_info(&self, info: &VersionInfo) {
        debug!(version = info.version, "Outputting version info");
        let label = |name: &str| format!("  {name:<10}");
        self.line(&format!(
            "{} {}",
            self.theme.header.apply_to("regswap"),
            self.theme.value.apply_to(info.version)
        ));

        let dirty = if info.git_dirty {
            self.theme.warning.apply_to(" (dirty)").to_string()
        } else {
            String::new()
        };
        let rows = [
            ("Git SHA", format!("{}{dirty}", info.git_sha)),
            ("Built", info.build_timestamp.to_string()),
            ("Rust", info.rustc_version.to_string()),
            ("Target", info.target.to_string()),
        ];
        for (name, value) in rows {
            self.line(&format!("{}{value}", self.theme.label.apply_to(label(name))));
        }
    }
}
