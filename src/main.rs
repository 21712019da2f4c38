//! regswap - Save and restore registry key snapshots as named profiles.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::debug;

use regswap::cli::{self, Cli, Commands, KeysAction};
use regswap::config::{StoragePaths, default_definitions, key_identifier};
use regswap::error::{Result, RsError};
use regswap::logging::init_logging;
use regswap::manager::{OrphanPolicy, OverallStatus, ProfileManager};
use regswap::menu::Menu;
use regswap::output::{BackupListing, Output, OutputMode, VersionInfo};
use regswap::prompt::{FixedPrompter, Prompter, TerminalPrompter};
use regswap::registry::RegTool;
use regswap::state::AppContext;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> bool {
        option_env!("VERGEN_GIT_DIRTY") == Some("true")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let output = OutputMode::from_cli(&cli).into_output();

    match run(&cli, output.as_ref()) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Partial) => ExitCode::FAILURE,
        Err(e) => {
            output_error(output.as_ref(), &e);
            ExitCode::FAILURE
        }
    }
}

/// How a successful command ended.
enum Outcome {
    Done,
    /// Some keys failed.
    Partial,
}

impl From<OverallStatus> for Outcome {
    fn from(status: OverallStatus) -> Self {
        match status {
            OverallStatus::PartialSuccess => Self::Partial,
            _ => Self::Done,
        }
    }
}

fn run(cli: &Cli, out: &dyn Output) -> anyhow::Result<Outcome> {
    // Commands that never touch storage
    match &cli.command {
        Some(Commands::Version) => {
            cmd_version(out);
            return Ok(Outcome::Done);
        }
        Some(Commands::Completions(args)) => {
            cmd_completions(args);
            return Ok(Outcome::Done);
        }
        None if cli.use_json() => {
            print_robot_quick_start();
            return Ok(Outcome::Done);
        }
        _ => {}
    }

    let paths = StoragePaths::resolve(cli.base_dir.as_deref())
        .context("Could not resolve the storage directory")?;
    let ctx = AppContext::open(paths, default_definitions())?;
    let registry = RegTool::new().with_timeout(Duration::from_secs(cli.tool_timeout));
    let mut manager = ProfileManager::new(ctx, Box::new(registry));

    Ok(dispatch(cli, &mut manager, out)?)
}

fn dispatch(cli: &Cli, manager: &mut ProfileManager, out: &dyn Output) -> Result<Outcome> {
    match &cli.command {
        None => cmd_menu(manager, out),
        Some(Commands::Save(args)) => cmd_save(manager, out, args),
        Some(Commands::Load(args)) => cmd_load(manager, out, args),
        Some(Commands::List) => {
            out.profile_list(manager.profiles());
            Ok(Outcome::Done)
        }
        Some(Commands::Rename(args)) => cmd_rename(manager, out, args),
        Some(Commands::Delete(args)) => cmd_delete(manager, out, args),
        Some(Commands::Clear(args)) => cmd_clear(manager, out, args),
        Some(Commands::Keys(args)) => cmd_keys(manager, out, args),
        Some(Commands::DefaultName(args)) => {
            manager.config_mut().set_default_profile_name(&args.name)?;
            out.default_name_set(&manager.config().default_profile_name);
            Ok(Outcome::Done)
        }
        Some(Commands::Backups(args)) => cmd_backups(manager, out, args),
        Some(Commands::Version | Commands::Completions(_)) => Ok(Outcome::Done),
    }
}

/// `--yes` answers everything; otherwise ask on a terminal and refuse
/// when there is none.
fn prompter_for(yes: bool) -> Box<dyn Prompter> {
    if yes {
        Box::new(FixedPrompter(true))
    } else if io::stdin().is_terminal() {
        Box::new(TerminalPrompter::new())
    } else {
        debug!("No terminal; confirmations will be refused");
        Box::new(FixedPrompter(false))
    }
}

// === Command Implementations ===

fn cmd_menu(manager: &mut ProfileManager, out: &dyn Output) -> Result<Outcome> {
    let mut prompter = TerminalPrompter::new();
    Menu::new(manager, out, &mut prompter).run()?;
    Ok(Outcome::Done)
}

fn cmd_save(manager: &mut ProfileManager, out: &dyn Output, args: &cli::SaveArgs) -> Result<Outcome> {
    let mut prompter = prompter_for(args.yes);
    let name = args.name.as_deref().unwrap_or_default();
    let report = manager.save_profile(name, prompter.as_mut())?;
    out.save_report(&report);
    Ok(report.status.into())
}

fn cmd_load(manager: &mut ProfileManager, out: &dyn Output, args: &cli::LoadArgs) -> Result<Outcome> {
    let mut prompter = prompter_for(args.yes);
    let policy = args.orphans.map_or(OrphanPolicy::Ask, OrphanPolicy::from);
    let report = manager.load_profile(&args.profile, policy, prompter.as_mut())?;
    out.load_report(&report);
    Ok(report.status.into())
}

fn cmd_rename(
    manager: &mut ProfileManager,
    out: &dyn Output,
    args: &cli::RenameArgs,
) -> Result<Outcome> {
    let outcome = manager.rename_profile(&args.profile, &args.new_name)?;
    out.rename_result(&args.profile, args.new_name.trim(), &outcome);
    Ok(Outcome::Done)
}

fn cmd_delete(
    manager: &mut ProfileManager,
    out: &dyn Output,
    args: &cli::DeleteArgs,
) -> Result<Outcome> {
    let mut prompter = prompter_for(args.yes);
    let report = manager.delete_profile(&args.profile, prompter.as_mut())?;
    out.remove_report(&report);
    Ok(report.status.into())
}

fn cmd_clear(manager: &mut ProfileManager, out: &dyn Output, args: &cli::ClearArgs) -> Result<Outcome> {
    let mut prompter = prompter_for(args.yes);
    let report = manager.delete_live_keys(args.save_as.as_deref(), prompter.as_mut())?;
    out.delete_report(&report);
    let save_failed = report
        .save
        .as_ref()
        .is_some_and(|s| s.status == OverallStatus::PartialSuccess);
    if save_failed {
        return Ok(Outcome::Partial);
    }
    Ok(report.status.into())
}

fn cmd_keys(manager: &mut ProfileManager, out: &dyn Output, args: &cli::KeysArgs) -> Result<Outcome> {
    let (selector, include) = match &args.action {
        None | Some(KeysAction::List) => {
            out.key_list(&manager.config().managed_keys);
            return Ok(Outcome::Done);
        }
        Some(KeysAction::Include(sel)) => (&sel.key, true),
        Some(KeysAction::Exclude(sel)) => (&sel.key, false),
    };

    let path = manager
        .config()
        .find_key(selector)
        .map(|k| k.path.clone())
        .ok_or_else(|| RsError::KeyNotFound {
            key: selector.clone(),
        })?;
    manager.config_mut().set_inclusion(&path, include)?;
    if let Some(key) = manager.config().find_key(&path) {
        out.inclusion_changed(key);
    }
    Ok(Outcome::Done)
}

fn cmd_backups(
    manager: &mut ProfileManager,
    out: &dyn Output,
    args: &cli::BackupsArgs,
) -> Result<Outcome> {
    let identifiers: Vec<String> = match &args.key {
        Some(selector) => {
            let key = manager
                .config()
                .find_key(selector)
                .ok_or_else(|| RsError::KeyNotFound {
                    key: selector.clone(),
                })?;
            vec![key.key_identifier()]
        }
        None => manager
            .config()
            .managed_keys
            .iter()
            .map(|k| key_identifier(&k.file_name))
            .collect(),
    };

    let mut listings = Vec::with_capacity(identifiers.len());
    for key_identifier in identifiers {
        let files = manager
            .backups()
            .list(&key_identifier)?
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        listings.push(BackupListing {
            key_identifier,
            files,
        });
    }
    out.backup_list(&listings);
    Ok(Outcome::Done)
}

fn cmd_version(out: &dyn Output) {
    out.version_info(&VersionInfo {
        version: build_info::VERSION,
        git_sha: build_info::git_sha(),
        git_dirty: build_info::git_dirty(),
        build_timestamp: build_info::build_timestamp(),
        rustc_version: build_info::rustc_semver(),
        target: build_info::target(),
    });
}

fn cmd_completions(args: &cli::CompletionsArgs) {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "regswap", &mut io::stdout());
}

// === Quick Start (Robot Mode) ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    profiles: RobotProfiles,
    live_keys: RobotLiveKeys,
    configuration: RobotConfiguration,
    output_modes: OutputModes,
    storage: &'static str,
}

#[derive(Serialize)]
struct RobotProfiles {
    save: &'static str,
    load: &'static str,
    list: &'static str,
    rename: &'static str,
    delete: &'static str,
}

#[derive(Serialize)]
struct RobotLiveKeys {
    clear: &'static str,
    clear_with_save: &'static str,
    backups: &'static str,
}

#[derive(Serialize)]
struct RobotConfiguration {
    list_keys: &'static str,
    include_key: &'static str,
    exclude_key: &'static str,
    default_name: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

fn print_robot_quick_start() {
    let help = RobotQuickStart {
        tool: "regswap",
        version: build_info::VERSION,
        description: "Save and restore registry key snapshots as named profiles",
        profiles: RobotProfiles {
            save: "regswap save [NAME] --yes --robot",
            load: "regswap load <PROFILE> --orphans skip --yes --robot",
            list: "regswap list --robot",
            rename: "regswap rename <PROFILE> <NEW_NAME> --robot",
            delete: "regswap delete <PROFILE> --yes --robot",
        },
        live_keys: RobotLiveKeys {
            clear: "regswap clear --yes --robot",
            clear_with_save: "regswap clear --save-as <NAME> --yes --robot",
            backups: "regswap backups [KEY] --robot",
        },
        configuration: RobotConfiguration {
            list_keys: "regswap keys --robot",
            include_key: "regswap keys include <KEY>",
            exclude_key: "regswap keys exclude <KEY>",
            default_name: "regswap default-name <NAME>",
        },
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
        },
        storage: "--base-dir <DIR> or REGSWAP_HOME",
    };

    match serde_json::to_string_pretty(&help) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{e}"),
    }
}

// === Utility Functions ===

fn output_error(out: &dyn Output, error: &anyhow::Error) {
    if let Some(rs) = error.downcast_ref::<RsError>() {
        out.error(rs);
    } else {
        out.error(&RsError::Other(format!("{error:#}")));
    }
}
