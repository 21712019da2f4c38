//! End-to-end profile workflows over the mock registry.

use std::sync::Arc;

use regswap::error::RsError;
use regswap::manager::{KeyAction, OrphanPolicy, OverallStatus};
use regswap::profile::{ProfileStore, RenameOutcome};
use regswap::prompt::{FixedPrompter, ScriptedPrompter};
use regswap::registry::mock::{MockRegistry, Operation};

use crate::common::{KEY_A, KEY_B, KEY_C, TestWorkspace};

fn seeded() -> MockRegistry {
    MockRegistry::new()
        .with_key(KEY_A, r#""Account"="first""#)
        .with_key(KEY_B, r#""Region"="eu""#)
        .with_key(KEY_C, r#""Token"="abc""#)
}

// ===== Save / Load Round Trip =====

#[test]
fn test_switch_between_two_profiles() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();

    let p1 = mgr.save_profile("P1", &mut FixedPrompter(true)).unwrap();
    assert_eq!(p1.status, OverallStatus::FullSuccess);

    ws.registry.set_key(KEY_A, r#""Account"="second""#);
    ws.registry.set_key(KEY_B, r#""Region"="us""#);
    let p2 = mgr.save_profile("P2", &mut FixedPrompter(true)).unwrap();
    assert_eq!(p2.status, OverallStatus::FullSuccess);

    let report = mgr
        .load_profile("P1", OrphanPolicy::Skip, &mut FixedPrompter(false))
        .unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert_eq!(ws.registry.key(KEY_A).as_deref(), Some(r#""Account"="first""#));
    assert_eq!(ws.registry.key(KEY_B).as_deref(), Some(r#""Region"="eu""#));

    // Both live keys existed, so both were backed up before the import
    assert!(report.keys.iter().all(|k| k.backup.is_some()));
    let backups = TestWorkspace::files_in(&ws.backups_dir());
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().any(|f| f.starts_with("A_backup_")));
    assert!(backups.iter().any(|f| f.starts_with("B_backup_")));

    let report = mgr
        .load_profile("p2", OrphanPolicy::Skip, &mut FixedPrompter(false))
        .unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert_eq!(ws.registry.key(KEY_A).as_deref(), Some(r#""Account"="second""#));
}

#[test]
fn test_saved_profile_survives_restart() {
    let ws = TestWorkspace::new(seeded());
    let folder_id = {
        let mut mgr = ws.manager();
        mgr.save_profile("Work", &mut FixedPrompter(true))
            .unwrap()
            .folder_id
            .unwrap()
    };

    let mgr = ws.manager();
    assert_eq!(mgr.profiles().len(), 1);
    let profile = &mgr.profiles()[0];
    assert_eq!(profile.name, "Work");
    assert_eq!(profile.folder_id, folder_id);
    assert_eq!(
        profile.included_key_files.as_deref(),
        Some(&["A.reg".to_string(), "B.reg".to_string()][..])
    );
    assert_eq!(
        TestWorkspace::files_in(&ws.profile_dir(&folder_id)),
        vec!["A.reg", "B.reg"]
    );
}

#[test]
fn test_excluded_key_is_not_snapshotted() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();

    let report = mgr.save_profile("Only", &mut FixedPrompter(true)).unwrap();
    assert!(report.keys.iter().all(|k| k.file_name != "C.reg"));
    ws.registry.assert_contains(&Operation::Export {
        path: KEY_A.to_string(),
        dest: ws
            .profile_dir(report.folder_id.as_deref().unwrap())
            .join("A.reg")
            .display()
            .to_string(),
    });
    assert!(!ws.registry.operations().iter().any(|op| matches!(
        op,
        Operation::Export { path, .. } if path == KEY_C
    )));
}

#[test]
fn test_key_toggled_off_is_left_out_of_next_save() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    mgr.config_mut().set_inclusion(KEY_B, false).unwrap();

    let report = mgr.save_profile("NoBeta", &mut FixedPrompter(true)).unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
    let id = report.folder_id.unwrap();
    assert_eq!(
        mgr.find_profile("NoBeta").unwrap().included_key_files.as_deref(),
        Some(&["A.reg".to_string()][..])
    );
    assert_eq!(TestWorkspace::files_in(&ws.profile_dir(&id)), vec!["A.reg"]);
}

#[test]
fn test_absent_key_is_skipped_and_save_succeeds() {
    let ws = TestWorkspace::new(MockRegistry::new().with_key(KEY_A, "x"));
    let mut mgr = ws.manager();

    let report = mgr.save_profile("Partial", &mut FixedPrompter(true)).unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
    let b = report.keys.iter().find(|k| k.file_name == "B.reg").unwrap();
    assert_eq!(b.action, KeyAction::SkippedAbsent);
    assert_eq!(
        mgr.profiles()[0].included_key_files.as_deref(),
        Some(&["A.reg".to_string()][..])
    );
}

// ===== Overwrite =====

#[test]
fn test_overwrite_declined_leaves_everything_untouched() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    mgr.save_profile("P1", &mut FixedPrompter(true)).unwrap();

    let catalog_before = std::fs::read(ws.paths().profiles_file()).unwrap();
    let data_before = TestWorkspace::files_in(&ws.paths().profile_data_dir());
    ws.registry.clear_operations();

    let report = mgr.save_profile("p1", &mut FixedPrompter(false)).unwrap();
    assert_eq!(report.status, OverallStatus::Cancelled);
    assert_eq!(std::fs::read(ws.paths().profiles_file()).unwrap(), catalog_before);
    assert_eq!(
        TestWorkspace::files_in(&ws.paths().profile_data_dir()),
        data_before
    );
    ws.registry.assert_no_mutations();
}

#[test]
fn test_overwrite_confirmed_replaces_profile() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    let first = mgr.save_profile("P1", &mut FixedPrompter(true)).unwrap();
    let old_id = first.folder_id.unwrap();

    ws.registry.set_key(KEY_A, "changed");
    let mut prompter = ScriptedPrompter::new().confirm_with(true);
    let second = mgr.save_profile("P1", &mut prompter).unwrap();

    assert_eq!(prompter.asked().len(), 1);
    assert_eq!(second.status, OverallStatus::FullSuccess);
    assert_eq!(second.replaced.as_deref(), Some(old_id.as_str()));
    let new_id = second.folder_id.unwrap();
    assert_ne!(new_id, old_id);

    assert_eq!(mgr.profiles().len(), 1);
    assert!(!ws.profile_dir(&old_id).exists());
    assert!(ws.profile_dir(&new_id).join("A.reg").is_file());
}

#[test]
fn test_failed_overwrite_keeps_previous_snapshot() {
    let ws = TestWorkspace::new(seeded());
    let old_id = {
        let mut mgr = ws.manager();
        mgr.save_profile("P1", &mut FixedPrompter(true))
            .unwrap()
            .folder_id
            .unwrap()
    };

    let failing = Arc::new(seeded().failing_export(KEY_B));
    let mut mgr = ws.manager_over(&failing);

    let report = mgr.save_profile("P1", &mut FixedPrompter(true)).unwrap();
    assert_eq!(report.status, OverallStatus::PartialSuccess);
    assert!(report.folder_id.is_none());
    assert_eq!(report.failures(), 1);

    let catalog = ProfileStore::load(ws.paths().profiles_file());
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.list()[0].folder_id, old_id);
    assert_eq!(
        TestWorkspace::files_in(&ws.paths().profile_data_dir()),
        vec![old_id]
    );
}

// ===== Load Failures =====

#[test]
fn test_load_with_one_import_failure_is_partial() {
    let ws = TestWorkspace::new(seeded().failing_import("B.reg"));
    let mut mgr = ws.manager();
    mgr.save_profile("P1", &mut FixedPrompter(true)).unwrap();

    let report = mgr
        .load_profile("P1", OrphanPolicy::Skip, &mut FixedPrompter(false))
        .unwrap();
    assert_eq!(report.status, OverallStatus::PartialSuccess);
    assert_eq!(report.failures(), 1);
    // The other key was still imported
    assert_eq!(ws.registry.imported_files(), vec!["A.reg", "B.reg"]);
}

#[test]
fn test_load_missing_data_dir_changes_nothing() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    let id = mgr
        .save_profile("Gone", &mut FixedPrompter(true))
        .unwrap()
        .folder_id
        .unwrap();
    std::fs::remove_dir_all(ws.profile_dir(&id)).unwrap();
    let catalog_before = std::fs::read(ws.paths().profiles_file()).unwrap();
    ws.registry.clear_operations();

    let err = mgr
        .load_profile("Gone", OrphanPolicy::Import, &mut FixedPrompter(true))
        .unwrap_err();
    assert!(matches!(err, RsError::DataDirMissing { .. }));
    assert_eq!(std::fs::read(ws.paths().profiles_file()).unwrap(), catalog_before);
    ws.registry.assert_no_mutations();
    assert!(TestWorkspace::files_in(&ws.backups_dir()).is_empty());
}

// ===== Delete Live Keys =====

#[test]
fn test_clear_with_save_then_restore() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();

    let report = mgr
        .delete_live_keys(Some("Before clear"), &mut FixedPrompter(true))
        .unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert_eq!(report.save.as_ref().unwrap().status, OverallStatus::FullSuccess);
    assert!(!ws.registry.has_key(KEY_A));
    assert!(!ws.registry.has_key(KEY_B));
    // Excluded key stays
    assert!(ws.registry.has_key(KEY_C));

    mgr.load_profile("Before clear", OrphanPolicy::Skip, &mut FixedPrompter(false))
        .unwrap();
    assert_eq!(ws.registry.key(KEY_A).as_deref(), Some(r#""Account"="first""#));
    assert_eq!(ws.registry.key(KEY_B).as_deref(), Some(r#""Region"="eu""#));
}

#[test]
fn test_clear_declined_deletes_nothing() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();

    let report = mgr.delete_live_keys(None, &mut FixedPrompter(false)).unwrap();
    assert_eq!(report.status, OverallStatus::Cancelled);
    ws.registry.assert_no_mutations();
}

// ===== Rename / Delete Profile =====

#[test]
fn test_rename_to_same_name_is_a_no_op() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    mgr.save_profile("Main", &mut FixedPrompter(true)).unwrap();
    let before = std::fs::read(ws.paths().profiles_file()).unwrap();

    let outcome = mgr.rename_profile("Main", " Main ").unwrap();
    assert_eq!(outcome, RenameOutcome::Unchanged);
    assert_eq!(std::fs::read(ws.paths().profiles_file()).unwrap(), before);
}

#[test]
fn test_rename_onto_existing_name_fails() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    mgr.save_profile("One", &mut FixedPrompter(true)).unwrap();
    mgr.save_profile("Two", &mut FixedPrompter(true)).unwrap();

    let err = mgr.rename_profile("Two", "ONE").unwrap_err();
    assert!(matches!(err, RsError::DuplicateName { .. }));
    assert!(mgr.find_profile("Two").is_ok());
}

#[test]
fn test_rename_then_load_by_new_name() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    mgr.save_profile("Old", &mut FixedPrompter(true)).unwrap();

    let outcome = mgr.rename_profile("Old", "New").unwrap();
    assert_eq!(
        outcome,
        RenameOutcome::Renamed {
            from: "Old".to_string()
        }
    );

    let mgr = ws.manager();
    assert!(mgr.find_profile("Old").is_err());
    let report = mgr
        .load_profile("New", OrphanPolicy::Skip, &mut FixedPrompter(false))
        .unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
}

#[test]
fn test_delete_profile_removes_entry_and_directory() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    let id = mgr
        .save_profile("Temp", &mut FixedPrompter(true))
        .unwrap()
        .folder_id
        .unwrap();

    let report = mgr.delete_profile(&id, &mut FixedPrompter(true)).unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert!(report.directory_removed);
    assert!(!ws.profile_dir(&id).exists());
    assert!(ws.manager().profiles().is_empty());
}

#[test]
fn test_delete_one_profile_leaves_the_other_intact() {
    let ws = TestWorkspace::new(seeded());
    let mut mgr = ws.manager();
    let p1 = mgr
        .save_profile("P1", &mut FixedPrompter(true))
        .unwrap()
        .folder_id
        .unwrap();
    assert_eq!(
        TestWorkspace::files_in(&ws.profile_dir(&p1)),
        vec!["A.reg", "B.reg"]
    );

    mgr.config_mut().set_inclusion(KEY_B, false).unwrap();
    let p2 = mgr
        .save_profile("P2", &mut FixedPrompter(true))
        .unwrap()
        .folder_id
        .unwrap();
    assert_eq!(TestWorkspace::files_in(&ws.profile_dir(&p2)), vec!["A.reg"]);

    let report = mgr.delete_profile("P1", &mut FixedPrompter(true)).unwrap();
    assert_eq!(report.status, OverallStatus::FullSuccess);
    assert!(!ws.profile_dir(&p1).exists());
    assert_eq!(TestWorkspace::files_in(&ws.profile_dir(&p2)), vec!["A.reg"]);

    let mgr = ws.manager();
    assert_eq!(mgr.profiles().len(), 1);
    let remaining = mgr.find_profile("P2").unwrap();
    assert_eq!(remaining.folder_id, p2);
    assert_eq!(
        remaining.included_key_files.as_deref(),
        Some(&["A.reg".to_string()][..])
    );
}
