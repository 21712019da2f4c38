//! `reg.exe` backed implementation of [`RegistrySnapshotter`].
//!
//! Every invocation is a blocking child process polled against a deadline;
//! a child that outlives it is killed and reported as `ToolTimeout`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, instrument, trace, warn};

use super::RegistrySnapshotter;
use crate::error::{Result, RsError};

/// Default deadline for one tool invocation.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Short failure description for error messages.
    pub fn describe(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.status.code(), stderr.is_empty()) {
            (Some(code), true) => format!("exit code {code}"),
            (Some(code), false) => format!("exit code {code}: {stderr}"),
            (None, _) => "terminated by signal".to_string(),
        }
    }
}

/// Run `program args...`, killing it if it runs longer than `timeout`.
pub fn run_with_timeout(program: &Path, args: &[&str], timeout: Duration) -> Result<ToolOutput> {
    let command_line = format!("{} {}", program.display(), args.join(" "));
    debug!(command = %command_line, "Running registry tool");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RsError::ToolSpawn {
            program: program.display().to_string(),
            reason: e.to_string(),
        })?;

    // Drain stderr while polling; a full pipe blocks the child
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() >= timeout {
            warn!(command = %command_line, "Timeout reached, killing registry tool");
            let _ = child.kill();
            let _ = child.wait();
            return Err(RsError::ToolTimeout {
                command: command_line,
                secs: timeout.as_secs(),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();
    trace!(?status, elapsed_ms = start.elapsed().as_millis(), "Registry tool finished");
    Ok(ToolOutput { status, stderr })
}

/// Registry access through the Windows `reg` command.
#[derive(Debug, Clone)]
pub struct RegTool {
    program: PathBuf,
    timeout: Duration,
}

impl Default for RegTool {
    fn default() -> Self {
        Self::new()
    }
}

impl RegTool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("reg"),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Use a different executable (e.g. a full path to `reg.exe`).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, args: &[&str]) -> Result<ToolOutput> {
        run_with_timeout(&self.program, args, self.timeout)
    }
}

impl RegistrySnapshotter for RegTool {
    #[instrument(skip(self))]
    fn exists(&self, path: &str) -> bool {
        match self.run(&["query", path]) {
            Ok(output) => output.success(),
            Err(e) => {
                warn!(key = path, error = %e, "Could not query registry key");
                false
            }
        }
    }

    #[instrument(skip(self), fields(dest = %dest.display()))]
    fn export(&self, path: &str, dest: &Path) -> Result<()> {
        let dest_str = dest.to_string_lossy();
        let output = self.run(&["export", path, &dest_str, "/y"])?;
        if output.success() {
            Ok(())
        } else {
            Err(RsError::ExportFailed {
                key: path.to_string(),
                reason: output.describe(),
            })
        }
    }

    #[instrument(skip(self), fields(src = %src.display()))]
    fn import(&self, src: &Path) -> Result<()> {
        if !src.is_file() {
            return Err(RsError::ImportFailed {
                file: src.display().to_string(),
                reason: "file not found".to_string(),
            });
        }
        let src_str = src.to_string_lossy();
        let output = self.run(&["import", &src_str])?;
        if output.success() {
            Ok(())
        } else {
            Err(RsError::ImportFailed {
                file: src.display().to_string(),
                reason: output.describe(),
            })
        }
    }

    #[instrument(skip(self))]
    fn delete(&self, path: &str) -> Result<()> {
        let output = self.run(&["delete", path, "/f"])?;
        if output.success() {
            Ok(())
        } else {
            Err(RsError::DeleteFailed {
                key: path.to_string(),
                reason: output.describe(),
            })
        }
    }
}
