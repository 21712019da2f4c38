//! Robot mode JSON output implementation.

use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::config::ManagedKeyState;
use crate::error::RsError;
use crate::manager::{DeleteReport, LoadReport, RemoveReport, SaveReport};
use crate::profile::{Profile, RenameOutcome};

use super::{BackupListing, Output, RobotFormat, VersionInfo};

/// JSON output implementation for AI agents and scripting.
///
/// Results go to stdout; errors go to stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    /// Render any serializable data as JSON in the configured format.
    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let result = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        result
            .inspect_err(|e| warn!(error = %e, "JSON serialization failed"))
            .ok()
    }

    /// Output any serializable data as JSON to stdout.
    #[instrument(skip(self, data), fields(format = ?self.format))]
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            trace!(json_len = json.len(), "JSON serialized");
            println!("{json}");
        }
    }

    /// Output JSON to stderr.
    fn output_json_stderr<T: Serialize>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }

    fn command_result<T: Serialize>(&self, command: &str, ok: bool, report: &T) {
        self.output_json(&serde_json::json!({
            "command": command,
            "ok": ok,
            "result": report,
        }));
    }
}

impl Output for RobotOutput {
    #[instrument(skip(self))]
    fn success(&self, message: &str) {
        debug!(message, "Robot: success");
        self.output_json(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &RsError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        debug!(message, "Robot: warning");
        self.output_json(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn info(&self, message: &str) {
        debug!(message, "Robot: info");
        self.output_json(&serde_json::json!({
            "info": true,
            "message": message
        }));
    }

    #[instrument(skip(self, profiles), fields(count = profiles.len()))]
    fn profile_list(&self, profiles: &[Profile]) {
        debug!("Robot: profile_list");
        self.output_json(profiles);
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    fn key_list(&self, keys: &[ManagedKeyState]) {
        debug!("Robot: key_list");
        self.output_json(keys);
    }

    #[instrument(skip(self, listings), fields(count = listings.len()))]
    fn backup_list(&self, listings: &[BackupListing]) {
        debug!("Robot: backup_list");
        self.output_json(listings);
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn save_report(&self, report: &SaveReport) {
        self.command_result("save", report.failures() == 0, report);
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn load_report(&self, report: &LoadReport) {
        self.command_result("load", report.failures() == 0, report);
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn delete_report(&self, report: &DeleteReport) {
        let ok = !report.keys.iter().any(|k| k.is_failure());
        self.command_result("clear", ok, report);
    }

    #[instrument(skip(self, report), fields(status = ?report.status))]
    fn remove_report(&self, report: &RemoveReport) {
        self.command_result("delete", true, report);
    }

    #[instrument(skip(self))]
    fn rename_result(&self, profile: &str, new_name: &str, outcome: &RenameOutcome) {
        let (changed, from) = match outcome {
            RenameOutcome::Renamed { from } => (true, from.as_str()),
            RenameOutcome::Unchanged => (false, profile),
        };
        self.output_json(&serde_json::json!({
            "command": "rename",
            "ok": true,
            "changed": changed,
            "from": from,
            "to": new_name,
        }));
    }

    #[instrument(skip(self, key), fields(key = %key.path))]
    fn inclusion_changed(&self, key: &ManagedKeyState) {
        self.output_json(key);
    }

    #[instrument(skip(self))]
    fn default_name_set(&self, name: &str) {
        self.output_json(&serde_json::json!({
            "command": "default-name",
            "ok": true,
            "default_profile_name": name,
        }));
    }

    #[instrument(skip(self, info))]
    fn version_info(&self, info: &VersionInfo) {
        debug!(version = info.version, "Robot: version_info");
        self.output_json(info);
    }
}
