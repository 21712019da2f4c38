//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::manager::OrphanPolicy;

/// regswap - Save and restore registry key snapshots as named profiles.
///
/// Run without a subcommand for the interactive menu.
/// Robot Mode: Use --robot or --format json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "regswap", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "REGSWAP_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Storage directory (default: <local data dir>/regswap)
    #[arg(long, global = true, env = "REGSWAP_HOME", value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Seconds to wait for each registry tool invocation
    #[arg(long, global = true, default_value = "30", value_name = "SECS")]
    pub tool_timeout: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Profiles ===
    /// Snapshot the included keys into a profile
    Save(SaveArgs),

    /// Restore a profile over the live keys
    Load(LoadArgs),

    /// List saved profiles
    List,

    /// Rename a profile
    Rename(RenameArgs),

    /// Delete a saved profile and its snapshot files
    Delete(DeleteArgs),

    // === Live keys ===
    /// Back up and delete the included live keys
    Clear(ClearArgs),

    // === Configuration ===
    /// List managed keys or change their inclusion
    Keys(KeysArgs),

    /// Set the name used when saving without one
    DefaultName(DefaultNameArgs),

    /// List retained safety backups
    Backups(BackupsArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct SaveArgs {
    /// Profile name (default: the configured default name)
    pub name: Option<String>,

    /// Overwrite an existing profile without asking
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Profile name or folder id
    pub profile: String,

    /// What to do with snapshot files matching no managed key
    #[arg(long, value_enum)]
    pub orphans: Option<OrphanArg>,

    /// Answer yes to every question
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Orphan handling on load.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrphanArg {
    Ask,
    Import,
    Skip,
}

impl From<OrphanArg> for OrphanPolicy {
    fn from(arg: OrphanArg) -> Self {
        match arg {
            OrphanArg::Ask => Self::Ask,
            OrphanArg::Import => Self::Import,
            OrphanArg::Skip => Self::Skip,
        }
    }
}

#[derive(Parser, Debug)]
pub struct RenameArgs {
    /// Profile name or folder id
    pub profile: String,

    /// New profile name
    pub new_name: String,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Profile name or folder id
    pub profile: String,

    /// Delete without asking
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Save a profile with this name first
    #[arg(long, value_name = "NAME")]
    pub save_as: Option<String>,

    /// Answer yes to every question
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub action: Option<KeysAction>,
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// List managed keys and their inclusion
    List,
    /// Include a key in saves and deletes
    Include(KeySelector),
    /// Exclude a key from saves and deletes
    Exclude(KeySelector),
}

#[derive(Parser, Debug)]
pub struct KeySelector {
    /// Registry path, snapshot file name, or identifier (e.g. "steam")
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct DefaultNameArgs {
    pub name: String,
}

#[derive(Parser, Debug)]
pub struct BackupsArgs {
    /// Only this key (path, file name or identifier)
    pub key: Option<String>,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
