//! # XED Import Tests
//!
//! The fixture tree imported into an in-memory store end to end.

use std::fs;

use isadex_core::config::ImportConfig;
use isadex_core::import::{ArmImporter, Importer, XedImporter, import_from_source};
use isadex_core::{IsaError, Store};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::common::{XED_FIXTURE_RECORDS, XED_ISA, arm_tree, init_tracing, store, xed_tree};

fn import(store: &mut Store, source: &std::path::Path) -> isadex_core::ImportSummary {
    import_from_source(&XedImporter::new(), store, source, &ImportConfig::default()).unwrap()
}

#[test]
fn test_fixture_import_counts() {
    init_tracing();
    let tree = xed_tree();
    let mut store = store();
    let summary = import(&mut store, tree.path());

    assert!(summary.success);
    assert_eq!(summary.isa, "x86_32,x86_64");
    assert_eq!(summary.stats.instructions_processed, XED_FIXTURE_RECORDS);
    assert_eq!(summary.stats.instructions_inserted, XED_FIXTURE_RECORDS);
    assert_eq!(summary.stats.errors, 1);
    assert_eq!(summary.stats.warnings, 0);
    assert_eq!(summary.source_version.as_deref(), Some("v2024.11.04"));

    let metadata = summary.metadata.unwrap();
    assert_eq!(metadata.architectures, 2);
    assert_eq!(metadata.registers, 18);
    assert_eq!(metadata.addressing_modes, 19);
}

#[test]
fn test_fixture_rows_by_isa() {
    let tree = xed_tree();
    let mut store = store();
    let _ = import(&mut store, tree.path());

    assert_eq!(store.supported_isas().unwrap(), vec!["x86_32", "x86_64"]);
    assert_eq!(store.instruction_count(Some("x86_32")).unwrap(), 3);
    assert_eq!(store.instruction_count(Some("x86_64")).unwrap(), 3);

    assert!(store.get_instruction("x86_32", "AAA", Some("AAA")).unwrap().is_some());
    assert!(store.get_instruction("x86_64", "AAA", Some("AAA")).unwrap().is_none());
    assert!(store.get_instruction("x86_64", "SYSCALL", Some("SYSCALL")).unwrap().is_some());
    assert!(store.get_instruction("x86_32", "SYSCALL", Some("SYSCALL")).unwrap().is_none());
    assert!(store.get_instruction("x86_64", "HLT", None).unwrap().is_none());

    let vaddps = store
        .get_instruction("x86_64", "VADDPS", Some("VADDPS_XMMdq_XMMdq_MEMdq"))
        .unwrap()
        .unwrap();
    assert_eq!(vaddps.cpuid_features, vec!["AVX"]);
    assert_eq!(store.search_count("vaddps", None).unwrap(), 2);
}

#[test]
fn test_reimport_is_idempotent() {
    let tree = xed_tree();
    let mut store = store();
    let _ = import(&mut store, tree.path());
    let add = store
        .get_instruction("x86_64", "ADD", Some("ADD_MEMb_GPR8"))
        .unwrap()
        .unwrap();

    let second = import(&mut store, tree.path());
    assert_eq!(second.stats.instructions_inserted, XED_FIXTURE_RECORDS);
    assert_eq!(store.instruction_count(None).unwrap(), XED_FIXTURE_RECORDS);
    assert_eq!(
        store.get_instruction("x86_64", "ADD", Some("ADD_MEMb_GPR8")).unwrap().unwrap(),
        add
    );
    assert_eq!(store.import_runs(None).unwrap().len(), 2);
    assert_eq!(store.architecture_registers("x86_64").unwrap().len(), 11);
}

#[test]
fn test_datafiles_directory_given_directly() {
    let tree = xed_tree();
    let datafiles = tree.path().join("datafiles");
    let importer = XedImporter::new();
    assert_eq!(XedImporter::datafiles_dir(&datafiles), datafiles);
    assert_eq!(importer.source_version(&datafiles).as_deref(), Some("v2024.11.04"));

    let files = XedImporter::instruction_files(&datafiles);
    assert_eq!(
        files,
        vec![
            datafiles.join("xed-isa.txt"),
            datafiles.join("avx").join("avx-isa.xed.txt"),
        ]
    );

    let mut store = store();
    let summary = import(&mut store, &datafiles);
    assert_eq!(summary.stats.instructions_inserted, XED_FIXTURE_RECORDS);
}

#[test]
fn test_empty_tree_succeeds_with_nothing() {
    let dir = TempDir::new().unwrap();
    let mut store = store();
    let summary = import(&mut store, dir.path());
    assert!(summary.success);
    assert_eq!(summary.stats.instructions_processed, 0);
    assert_eq!(summary.source_version, None);
    assert_eq!(summary.metadata.unwrap().registers, 0);
}

#[test]
fn test_missing_source_is_fatal_and_audited() {
    let dir = TempDir::new().unwrap();
    let mut store = store();
    let missing = dir.path().join("nope");
    let err = import_from_source(
        &XedImporter::new(),
        &mut store,
        &missing,
        &ImportConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IsaError::SourceNotFound(_)));

    let runs = store.import_runs(None).unwrap();
    assert_eq!(runs.len(), 1);
    assert!(!runs[0].success);
    assert_eq!(runs[0].isa, "x86_32,x86_64");
}

#[test]
fn test_unreadable_register_file_counts_one_error() {
    let dir = TempDir::new().unwrap();
    let datafiles = dir.path().join("datafiles");
    fs::create_dir_all(datafiles.join("xed-regs.txt")).unwrap();
    fs::write(datafiles.join("xed-isa.txt"), XED_ISA).unwrap();

    let mut store = store();
    let summary = import(&mut store, dir.path());
    assert!(summary.success);
    assert!(!summary.metadata_imported);
    assert_eq!(summary.stats.errors, 2);
    assert_eq!(summary.stats.instructions_inserted, 4);
}

#[test]
fn test_invalid_utf8_line_is_a_warning_not_a_truncation() {
    let tree = xed_tree();
    let main = tree.path().join("datafiles").join("xed-isa.txt");
    let mut bytes = b"COMMENT \xFF\xFE\n".to_vec();
    bytes.extend_from_slice(XED_ISA.as_bytes());
    fs::write(&main, bytes).unwrap();

    let mut store = store();
    let summary = import(&mut store, tree.path());
    assert!(summary.success);
    assert_eq!(summary.stats.instructions_processed, XED_FIXTURE_RECORDS);
    assert_eq!(summary.stats.instructions_inserted, XED_FIXTURE_RECORDS);
    assert_eq!(summary.stats.errors, 1);
    assert_eq!(summary.stats.warnings, 1);
    assert!(store.get_instruction("x86_64", "SYSCALL", Some("SYSCALL")).unwrap().is_some());
}

#[test]
fn test_import_order_does_not_matter() {
    let xed = xed_tree();
    let arm = arm_tree();
    let config = ImportConfig::default();

    let mut xed_first = store();
    let _ = import_from_source(&XedImporter::new(), &mut xed_first, xed.path(), &config).unwrap();
    let _ = import_from_source(&ArmImporter::new(), &mut xed_first, arm.path(), &config).unwrap();

    let mut arm_first = store();
    let _ = import_from_source(&ArmImporter::new(), &mut arm_first, arm.path(), &config).unwrap();
    let _ = import_from_source(&XedImporter::new(), &mut arm_first, xed.path(), &config).unwrap();

    for isa in ["x86_32", "x86_64", "aarch64"] {
        assert_eq!(
            xed_first.instruction_count(Some(isa)).unwrap(),
            arm_first.instruction_count(Some(isa)).unwrap(),
            "{isa} count"
        );
        assert_eq!(
            xed_first.instruction_groups(isa).unwrap(),
            arm_first.instruction_groups(isa).unwrap()
        );
    }
    assert_eq!(
        xed_first.list_architectures().unwrap().len(),
        arm_first.list_architectures().unwrap().len()
    );
}
