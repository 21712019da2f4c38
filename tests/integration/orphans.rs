//! Orphaned snapshot files: present in a profile directory, claimed by no
//! managed key.

use std::fs;
use std::path::Path;

use regswap::config::ManagedKeyDefinition;
use regswap::manager::{KeyAction, OrphanPolicy, OverallStatus};
use regswap::prompt::{FixedPrompter, ScriptedPrompter};
use regswap::registry::REG_FILE_HEADER;
use regswap::registry::mock::MockRegistry;

use crate::common::{KEY_A, KEY_B, KEY_C, TestWorkspace};

fn write_reg(path: &Path, key: &str, body: &str) {
    fs::write(path, format!("{REG_FILE_HEADER}\r\n\r\n[{key}]\r\n{body}\r\n")).unwrap();
}

fn only_a() -> Vec<ManagedKeyDefinition> {
    vec![ManagedKeyDefinition::new(KEY_A, "Alpha", "A.reg", true)]
}

/// Profile "Old" snapshotting A and B, with a stray C.reg beside them.
fn workspace_with_stray_file() -> (TestWorkspace, String) {
    let ws = TestWorkspace::new(
        MockRegistry::new()
            .with_key(KEY_A, "a1")
            .with_key(KEY_B, "b1"),
    );
    let id = ws
        .manager()
        .save_profile("Old", &mut FixedPrompter(true))
        .unwrap()
        .folder_id
        .unwrap();
    write_reg(&ws.profile_dir(&id).join("C.reg"), KEY_C, "c1");
    (ws, id)
}

#[test]
fn test_orphans_reported_but_not_imported_by_default() {
    let (ws, _) = workspace_with_stray_file();
    ws.registry.clear_operations();

    // Only A is still managed
    let mgr = ws.manager_with(only_a());
    let mut prompter = ScriptedPrompter::new().confirm_with(false);
    let report = mgr
        .load_profile("Old", OrphanPolicy::Ask, &mut prompter)
        .unwrap();

    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert_eq!(ws.registry.imported_files(), vec!["A.reg"]);
    assert!(report.orphaned.contains(&"C.reg".to_string()));
    assert!(!report.orphaned.contains(&"A.reg".to_string()));
    assert!(report.orphan_imports.is_empty());
    // Asked exactly once, for all orphans together
    assert_eq!(prompter.asked().len(), 1);
    assert!(!ws.registry.has_key(KEY_C));
}

#[test]
fn test_orphans_skip_policy_never_asks() {
    let (ws, _) = workspace_with_stray_file();
    let mgr = ws.manager_with(only_a());
    let mut prompter = ScriptedPrompter::new();

    let report = mgr
        .load_profile("Old", OrphanPolicy::Skip, &mut prompter)
        .unwrap();
    assert!(!report.orphaned.is_empty());
    assert!(prompter.asked().is_empty());
}

#[test]
fn test_accepted_orphans_are_backed_up_then_imported() {
    let (ws, _) = workspace_with_stray_file();
    ws.registry.set_key(KEY_B, "b-live");
    let mgr = ws.manager_with(only_a());

    let report = mgr
        .load_profile("Old", OrphanPolicy::Import, &mut FixedPrompter(false))
        .unwrap();

    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert_eq!(ws.registry.key(KEY_B).as_deref(), Some("b1"));
    assert_eq!(ws.registry.key(KEY_C).as_deref(), Some("c1"));

    let b = report
        .orphan_imports
        .iter()
        .find(|o| o.file_name == "B.reg")
        .unwrap();
    assert_eq!(b.action, KeyAction::Imported);
    assert_eq!(b.path.as_deref(), Some(KEY_B));
    assert!(b.backup.as_deref().unwrap().contains("B_backup_"));

    // C had no live key, so nothing to back up
    let c = report
        .orphan_imports
        .iter()
        .find(|o| o.file_name == "C.reg")
        .unwrap();
    assert!(c.backup.is_none());
}

#[test]
fn test_orphan_without_key_header_fails_alone() {
    let (ws, id) = workspace_with_stray_file();
    fs::write(ws.profile_dir(&id).join("notes.reg"), "not a registry export").unwrap();
    let mgr = ws.manager();

    let report = mgr
        .load_profile("Old", OrphanPolicy::Import, &mut FixedPrompter(true))
        .unwrap();

    assert_eq!(report.status, OverallStatus::PartialSuccess);
    let notes = report
        .orphan_imports
        .iter()
        .find(|o| o.file_name == "notes.reg")
        .unwrap();
    assert!(notes.is_failure());
    assert!(notes.path.is_none());
    // Managed keys were still restored
    assert_eq!(report.failures(), 1);
}

#[test]
fn test_legacy_profile_imports_every_present_managed_file() {
    let ws = TestWorkspace::new(MockRegistry::new());
    let id = "0b7f5a8e-legacy";
    let dir = ws.profile_dir(id);
    fs::create_dir_all(&dir).unwrap();
    write_reg(&dir.join("A.reg"), KEY_A, "a0");
    write_reg(&dir.join("C.reg"), KEY_C, "c0");
    fs::write(
        ws.paths().profiles_file(),
        format!(r#"[{{"name":"Legacy","folderNameGuid":"{id}","creationDate":"2023-05-01T10:00:00Z"}}]"#),
    )
    .unwrap();

    let mgr = ws.manager();
    let report = mgr
        .load_profile("legacy", OrphanPolicy::Skip, &mut FixedPrompter(false))
        .unwrap();

    // No file list recorded: every present file with a definition counts,
    // including the excluded key C
    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert_eq!(ws.registry.imported_files(), vec!["A.reg", "C.reg"]);
    assert!(report.orphaned.is_empty());
}

#[test]
fn test_empty_profile_directory_is_nothing_to_do() {
    let ws = TestWorkspace::new(MockRegistry::new());
    let id = ws
        .manager()
        .save_profile("Empty", &mut FixedPrompter(true))
        .unwrap()
        .folder_id
        .unwrap();
    assert!(TestWorkspace::files_in(&ws.profile_dir(&id)).is_empty());

    let report = ws
        .manager()
        .load_profile("Empty", OrphanPolicy::Ask, &mut FixedPrompter(true))
        .unwrap();
    assert_eq!(report.status, OverallStatus::NothingToDo);
    ws.registry.assert_no_mutations();
}
