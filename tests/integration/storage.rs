//! Catalog persistence, recovery from damaged files, and base-directory
//! resolution.

use std::fs;

use clap::Parser;
use regswap::cli::Cli;
use regswap::config::{CONFIG_FILE, PROFILES_FILE, StoragePaths};
use regswap::manager::OrphanPolicy;
use regswap::prompt::FixedPrompter;
use regswap::registry::mock::MockRegistry;

use crate::common::env::{EnvGuard, with_regswap_home};
use crate::common::{KEY_A, KEY_C, TestWorkspace};

#[test]
fn test_first_run_creates_layout() {
    let ws = TestWorkspace::new(MockRegistry::new());
    let mgr = ws.manager();

    assert!(ws.paths().profile_data_dir().is_dir());
    assert!(ws.backups_dir().is_dir());
    assert!(ws.base().join(CONFIG_FILE).is_file());
    assert!(mgr.profiles().is_empty());
    assert_eq!(mgr.config().managed_keys.len(), 3);
}

#[test]
fn test_inclusion_and_default_name_persist() {
    let ws = TestWorkspace::new(MockRegistry::new());
    {
        let mut mgr = ws.manager();
        mgr.config_mut().set_inclusion(KEY_A, false).unwrap();
        assert!(mgr.config_mut().toggle_inclusion(KEY_C).unwrap());
        mgr.config_mut().set_default_profile_name("  Main  ").unwrap();
    }

    let mgr = ws.manager();
    let config = mgr.config();
    assert_eq!(config.default_profile_name, "Main");
    assert!(!config.find_key(KEY_A).unwrap().is_included);
    assert!(config.find_key(KEY_C).unwrap().is_included);
}

#[test]
fn test_default_name_used_for_blank_save() {
    let ws = TestWorkspace::new(MockRegistry::new().with_key(KEY_A, "a"));
    let mut mgr = ws.manager();
    mgr.config_mut().set_default_profile_name("Daily").unwrap();

    let report = mgr.save_profile("   ", &mut FixedPrompter(true)).unwrap();
    assert_eq!(report.profile_name, "Daily");
    assert!(mgr.find_profile("daily").is_ok());
}

#[test]
fn test_corrupt_catalogs_are_preserved_and_replaced() {
    let ws = TestWorkspace::new(MockRegistry::new());
    fs::write(ws.base().join(PROFILES_FILE), "[{ not json").unwrap();
    fs::write(ws.base().join(CONFIG_FILE), "{{{").unwrap();

    let mgr = ws.manager();
    assert!(mgr.profiles().is_empty());
    assert_eq!(mgr.config().default_profile_name, "Default");

    let profiles_copy = ws.base().join(format!("{PROFILES_FILE}.corrupt"));
    let config_copy = ws.base().join(format!("{CONFIG_FILE}.corrupt"));
    assert_eq!(fs::read_to_string(profiles_copy).unwrap(), "[{ not json");
    assert_eq!(fs::read_to_string(config_copy).unwrap(), "{{{");
}

#[test]
fn test_catalog_drops_invalid_entries() {
    let ws = TestWorkspace::new(MockRegistry::new());
    fs::write(
        ws.base().join(PROFILES_FILE),
        r#"[
            {"name":"Good","folderNameGuid":"id-1","creationDate":"2024-01-01T00:00:00Z"},
            {"name":"","folderNameGuid":"id-2"},
            {"name":"No id"},
            {"name":"GOOD","folderNameGuid":"id-3"}
        ]"#,
    )
    .unwrap();

    let mgr = ws.manager();
    assert_eq!(mgr.profiles().len(), 1);
    assert_eq!(mgr.profiles()[0].folder_id, "id-1");
}

#[test]
fn test_catalog_drops_folder_ids_outside_profile_data() {
    let ws = TestWorkspace::new(MockRegistry::new().with_key(KEY_A, "a"));
    let keep_id = {
        let mut mgr = ws.manager();
        mgr.save_profile("Keep", &mut FixedPrompter(true)).unwrap();
        mgr.find_profile("Keep").unwrap().folder_id.clone()
    };

    let catalog = ws.base().join(PROFILES_FILE);
    let mut entries: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&catalog).unwrap()).unwrap();
    let planted = ["..", "/", "../..", "nested/dir", r"..\up"];
    for (i, id) in planted.iter().enumerate() {
        entries.as_array_mut().unwrap().push(serde_json::json!({
            "name": format!("Evil{i}"),
            "folderNameGuid": id,
            "creationDate": "2024-01-01T00:00:00Z",
        }));
    }
    fs::write(&catalog, entries.to_string()).unwrap();

    let mut mgr = ws.manager();
    assert_eq!(mgr.profiles().len(), 1);
    for i in 0..planted.len() {
        let err = mgr
            .delete_profile(&format!("Evil{i}"), &mut FixedPrompter(true))
            .unwrap_err();
        assert!(err.is_user_recoverable());
    }

    assert!(ws.base().join(CONFIG_FILE).is_file());
    assert!(ws.backups_dir().is_dir());
    assert!(ws.profile_dir(&keep_id).join("A.reg").is_file());
}

#[test]
fn test_stale_profile_reports_missing_directory() {
    let ws = TestWorkspace::new(MockRegistry::new());
    fs::write(
        ws.base().join(PROFILES_FILE),
        r#"[{"name":"Stale","folderNameGuid":"gone","creationDate":"2024-01-01T00:00:00Z"}]"#,
    )
    .unwrap();

    let err = ws
        .manager()
        .load_profile("Stale", OrphanPolicy::Skip, &mut FixedPrompter(false))
        .unwrap_err();
    assert!(err.is_user_recoverable());
    assert!(err.to_string().contains("Stale"));
}

// ===== Base Directory Resolution =====

#[test]
fn test_base_dir_from_environment() {
    let _guard = with_regswap_home("/tmp/regswap-env-home");
    let cli = Cli::try_parse_from(["regswap", "list"]).unwrap();
    let paths = StoragePaths::resolve(cli.base_dir.as_deref()).unwrap();
    assert_eq!(paths.base(), std::path::Path::new("/tmp/regswap-env-home"));
}

#[test]
fn test_base_dir_flag_beats_environment() {
    let _guard = with_regswap_home("/tmp/regswap-env-home");
    let cli = Cli::try_parse_from(["regswap", "--base-dir", "/tmp/flag-home", "list"]).unwrap();
    assert_eq!(
        cli.base_dir.as_deref(),
        Some(std::path::Path::new("/tmp/flag-home"))
    );
}

#[test]
fn test_default_base_dir_without_override() {
    let _guard = EnvGuard::remove("REGSWAP_HOME");
    let cli = Cli::try_parse_from(["regswap", "list"]).unwrap();
    assert!(cli.base_dir.is_none());
}
