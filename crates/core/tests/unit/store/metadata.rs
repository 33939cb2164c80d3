//! # Metadata Persistence Tests
//!
//! Bundle persistence, register families, display views, and single-row upserts.

use isadex_core::abi::Preservation;
use isadex_core::model::*;
use isadex_core::store::MetadataCounts;
use isadex_core::xed::metadata::build_metadata;
use pretty_assertions::assert_eq;

use crate::common::{store, xed_tree};

fn x86_store() -> isadex_core::Store {
    let tree = xed_tree();
    let meta = build_metadata(&tree.path().join("datafiles")).unwrap();
    let mut store = store();
    let counts = store.persist_metadata(&meta).unwrap();
    assert_eq!(
        counts,
        MetadataCounts {
            architectures: 2,
            registers: 18,
            addressing_modes: 19,
        }
    );
    store
}

#[test]
fn test_persist_is_idempotent() {
    let tree = xed_tree();
    let meta = build_metadata(&tree.path().join("datafiles")).unwrap();
    let mut store = store();
    let _ = store.persist_metadata(&meta).unwrap();
    let rax = store.register("x86_64", "RAX").unwrap().unwrap();

    let again = store.persist_metadata(&meta).unwrap();
    assert_eq!(again.registers, 18);
    assert_eq!(store.architecture_registers("x86_64").unwrap().len(), 11);
    assert_eq!(store.list_architectures().unwrap().len(), 2);
    assert_eq!(store.register("x86_64", "RAX").unwrap().unwrap().id, rax.id);
}

#[test]
fn test_architectures() {
    let store = x86_store();
    let names: Vec<String> = store
        .list_architectures()
        .unwrap()
        .into_iter()
        .map(|a| a.architecture.isa_name)
        .collect();
    assert_eq!(names, vec!["x86_32", "x86_64"]);

    let x64 = store.get_architecture("x86_64").unwrap().unwrap();
    assert_eq!(x64.architecture.word_size, 64);
    assert_eq!(x64.architecture.endianness, Endianness::Little);
    assert!(store.get_architecture("mips").unwrap().is_none());
}

#[test]
fn test_register_links_become_row_ids() {
    let store = x86_store();
    let rax = store.register("x86_64", "rax").unwrap().unwrap();
    let eax = store.register("x86_64", "EAX").unwrap().unwrap();
    assert!(rax.is_main_register);
    assert_eq!(rax.aliases, vec!["EAX", "AX", "AL", "AH"]);
    assert_eq!(eax.parent_register_id, Some(rax.id));
    assert!(!eax.is_main_register);

    let eax_32 = store.register("x86_32", "EAX").unwrap().unwrap();
    assert_ne!(eax_32.id, eax.id);
    assert_eq!(eax_32.parent_register_id, None);
    assert!(eax_32.is_main_register);
    assert!(store.register("x86_32", "R8").unwrap().is_none());
}

#[test]
fn test_register_family() {
    let store = x86_store();
    let ax = store.register("x86_64", "AX").unwrap().unwrap();
    let family: Vec<String> = store
        .register_family(ax.id)
        .unwrap()
        .into_iter()
        .map(|r| r.register_name)
        .collect();
    assert_eq!(family, vec!["RAX", "EAX", "AX", "AH", "AL"]);

    let rax = store.register("x86_64", "RAX").unwrap().unwrap();
    assert_eq!(store.register_family(rax.id).unwrap().len(), 5);

    let xmm = store.register("x86_64", "XMM0").unwrap().unwrap();
    let solo = store.register_family(xmm.id).unwrap();
    assert_eq!(solo.len(), 1);
    assert_eq!(solo[0].id, xmm.id);

    assert!(store.register_family(999_999).unwrap().is_empty());
}

#[test]
fn test_family_survives_corrupt_cycle() {
    let store = x86_store();
    let rax = store.register("x86_64", "RAX").unwrap().unwrap();
    let eax = store.register("x86_64", "EAX").unwrap().unwrap();
    let _ = store
        .connection()
        .execute(
            "UPDATE architecture_registers SET parent_register_id = ?1 WHERE id = ?2",
            [eax.id, rax.id],
        )
        .unwrap();
    let family = store.register_family(eax.id).unwrap();
    assert!(family.iter().any(|r| r.id == rax.id));
    assert!(family.len() <= 5);
}

#[test]
fn test_unreadable_aliases_decode_empty() {
    let store = x86_store();
    let _ = store
        .connection()
        .execute(
            "UPDATE architecture_registers SET aliases_json = '[EAX,' WHERE register_name = 'RAX'",
            [],
        )
        .unwrap();
    let rax = store.register("x86_64", "RAX").unwrap().unwrap();
    assert!(rax.aliases.is_empty());
    assert!(rax.is_main_register);
}

#[test]
fn test_register_views() {
    let store = x86_store();
    let views = store.register_views("x86_64").unwrap();
    assert_eq!(views.len(), 11);

    let find = |name: &str| views.iter().find(|v| v.register.register_name == name).unwrap();
    assert_eq!(find("RAX").preservation, Preservation::Volatile);
    assert_eq!(find("RSP").preservation, Preservation::Preserved);
    assert_eq!(find("XMM0").preservation, Preservation::Unspecified);
    assert_eq!(find("RSP").register.register_purpose.as_deref(), Some("stack pointer"));
    assert_eq!(find("AL").parent_name.as_deref(), Some("RAX"));
    assert_eq!(find("RAX").parent_name, None);
    assert_eq!(find("RAX").register_type, "general-purpose");
    assert_eq!(find("RFLAGS").register_type, "flags");

    let json = serde_json::to_value(find("AL")).unwrap();
    assert_eq!(json["register_name"], "AL");
    assert_eq!(json["preservation"], "volatile");
}

#[test]
fn test_addressing_modes_ordered() {
    let store = x86_store();
    let modes = store.addressing_modes("x86_64").unwrap();
    assert_eq!(modes.len(), 10);
    let names: Vec<&str> = modes.iter().map(|m| m.mode_name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert_eq!(store.addressing_modes("x86_32").unwrap().len(), 9);
}

#[test]
fn test_single_row_upserts() {
    let mut store = store();
    let architecture = Architecture {
        isa_name: "riscv64".to_owned(),
        word_size: 64,
        endianness: Endianness::Little,
        description: "RISC-V".to_owned(),
        machine_mode: "RV64".to_owned(),
    };
    let arch_id = store.upsert_architecture(&architecture).unwrap();
    assert_eq!(store.upsert_architecture(&architecture).unwrap(), arch_id);

    let root = Register::new(ArchIndex(42), "X1", "gpr", 64).main(true);
    let root_id = store.upsert_register(arch_id, &root, None).unwrap();
    let mut view = Register::new(ArchIndex(42), "W1", "gpr", 32);
    view.calling_convention_preserved = Some(true);
    let view_id = store.upsert_register(arch_id, &view, Some(root_id)).unwrap();

    let stored = store.register_by_id(view_id).unwrap().unwrap();
    assert_eq!(stored.architecture_id, arch_id);
    assert_eq!(stored.parent_register_id, Some(root_id));
    assert_eq!(stored.calling_convention_preserved, Some(true));
    assert_eq!(
        store.register_views("riscv64").unwrap()[0].preservation,
        Preservation::Preserved
    );

    let mode = AddressingMode {
        architecture: ArchIndex(7),
        mode_name: "base_offset".to_owned(),
        description: "Base plus offset".to_owned(),
        example_syntax: "ld a0, 8(sp)".to_owned(),
    };
    let mode_id = store.upsert_addressing_mode(arch_id, &mode).unwrap();
    assert_eq!(store.upsert_addressing_mode(arch_id, &mode).unwrap(), mode_id);
    assert_eq!(store.addressing_modes("riscv64").unwrap()[0].id, mode_id);
}

#[test]
fn test_unresolved_placeholders_are_skipped() {
    let mut meta = ArchMetadata::new();
    let arch = meta.push_architecture(architecture_stub());
    let _ = meta.push_register(Register::new(ArchIndex(5), "GHOST", "gpr", 64));
    let mut orphan = Register::new(arch, "W9", "gpr", 32);
    orphan.parent = Some(RegisterIndex(77));
    let _ = meta.push_register(orphan);
    meta.push_addressing_mode(ArchIndex(9), "lost", "Lost", "-");

    let mut store = store();
    let counts = store.persist_metadata(&meta).unwrap();
    assert_eq!(counts.architectures, 1);
    assert_eq!(counts.registers, 1);
    assert_eq!(counts.addressing_modes, 0);
    let w9 = store.register("test64", "W9").unwrap().unwrap();
    assert_eq!(w9.parent_register_id, None);
}

fn architecture_stub() -> Architecture {
    Architecture {
        isa_name: "test64".to_owned(),
        word_size: 64,
        endianness: Endianness::Big,
        description: "stub".to_owned(),
        machine_mode: "TEST".to_owned(),
    }
}

#[test]
fn test_arm_bundle_persists() {
    let mut store = store();
    let counts = store
        .persist_metadata(&isadex_core::arm::metadata::build_metadata())
        .unwrap();
    assert_eq!(counts.registers, 227);
    let b3 = store.register("aarch64", "b3").unwrap().unwrap();
    let family: Vec<String> = store
        .register_family(b3.id)
        .unwrap()
        .into_iter()
        .map(|r| r.register_name)
        .collect();
    assert_eq!(family, vec!["V3", "D3", "S3", "H3", "B3"]);
}
