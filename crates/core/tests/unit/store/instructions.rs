//! # Instruction Persistence Tests
//!
//! Upsert idempotence, natural-key lookups, deletion, listing, and grouping.

use isadex_core::model::Encoding;
use isadex_core::store::{PageRequest, SortDirection, SortKey, SortOrder};
use isadex_core::{IsaError, Store};
use pretty_assertions::assert_eq;
use rusqlite::params;
use tempfile::TempDir;

use crate::common::{described, instruction, store};

#[test]
fn test_upsert_and_get_round_trip() {
    let mut store = store();
    let record = instruction("x86_64", "ADD", Some("ADD_GPRv_GPRv"));
    let _ = store.upsert_instruction(&record).unwrap();

    let loaded = store
        .get_instruction("x86_64", "ADD", Some("ADD_GPRv_GPRv"))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, record);
}

#[test]
fn test_upsert_is_idempotent_and_keeps_id() {
    let mut store = store();
    let record = instruction("x86_64", "ADD", Some("v1"));
    let first = store.upsert_instruction(&record).unwrap();
    let second = store.upsert_instruction(&record).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.instruction_count(None).unwrap(), 1);

    let mut changed = record.clone();
    changed.description = "Replaced text".to_owned();
    changed.encoding = None;
    changed.flags_affected.clear();
    let third = store.upsert_instruction(&changed).unwrap();
    assert_eq!(third, first);

    let loaded = store.get_instruction("x86_64", "ADD", Some("v1")).unwrap().unwrap();
    assert_eq!(loaded, changed, "replacement is whole, not merged");
    assert_eq!(store.instruction_count(None).unwrap(), 1);
}

#[test]
fn test_null_variant_is_one_key() {
    let mut store = store();
    let a = store.upsert_instruction(&instruction("x86_64", "NOP", None)).unwrap();
    let b = store.upsert_instruction(&instruction("x86_64", "NOP", None)).unwrap();
    assert_eq!(a, b);
    let _ = store.upsert_instruction(&instruction("x86_64", "NOP", Some("wide"))).unwrap();
    assert_eq!(store.instruction_count(Some("x86_64")).unwrap(), 2);

    let plain = store.get_instruction("x86_64", "NOP", None).unwrap().unwrap();
    assert_eq!(plain.variant, None);
    assert!(store.get_instruction("x86_64", "NOP", Some("other")).unwrap().is_none());
}

#[test]
fn test_same_key_in_other_isa_is_distinct() {
    let mut store = store();
    let _ = store.upsert_instruction(&instruction("x86_32", "ADD", Some("v"))).unwrap();
    let _ = store.upsert_instruction(&instruction("x86_64", "ADD", Some("v"))).unwrap();
    assert_eq!(store.instruction_count(None).unwrap(), 2);
    assert_eq!(store.supported_isas().unwrap(), vec!["x86_32", "x86_64"]);
}

#[test]
fn test_upsert_rejects_invalid_record() {
    let mut store = store();
    let mut record = instruction("x86_64", "ADD", None);
    record.extension.clear();
    assert!(matches!(
        store.upsert_instruction(&record),
        Err(IsaError::Validation { missing: "extension", .. })
    ));
    assert_eq!(store.instruction_count(None).unwrap(), 0);
}

#[test]
fn test_delete_instruction() {
    let mut store = store();
    let _ = store.upsert_instruction(&instruction("x86_64", "ADD", Some("v"))).unwrap();
    assert!(!store.delete_instruction("x86_64", "ADD", None).unwrap());
    assert!(store.delete_instruction("x86_64", "ADD", Some("v")).unwrap());
    assert!(store.get_instruction("x86_64", "ADD", Some("v")).unwrap().is_none());
    assert_eq!(store.search_count("ADD", None).unwrap(), 0);
}

#[test]
fn test_list_sorting_and_paging() {
    let mut store = store();
    for (mnemonic, category) in [("SUB", "BINARY"), ("AND", "LOGICAL"), ("MOV", "DATAXFER")] {
        let _ = store
            .upsert_instruction(&described("x86_64", mnemonic, category, "text"))
            .unwrap();
    }
    let _ = store
        .upsert_instruction(&described("x86_32", "XOR", "LOGICAL", "text"))
        .unwrap();

    let page = store
        .list_instructions("x86_64", PageRequest::new(1, 2), SortOrder::default())
        .unwrap();
    let mnemonics: Vec<&str> = page.items.iter().map(|i| i.mnemonic.as_str()).collect();
    assert_eq!(mnemonics, vec!["AND", "MOV"]);
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    assert!(page.has_next && !page.has_prev);

    let second = store
        .list_instructions("x86_64", PageRequest::new(2, 2), SortOrder::default())
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].mnemonic, "SUB");
    assert!(!second.has_next && second.has_prev);

    let by_category = store
        .list_instructions(
            "x86_64",
            PageRequest::first(),
            SortOrder::new(SortKey::Category, SortDirection::Desc),
        )
        .unwrap();
    let categories: Vec<&str> = by_category.items.iter().map(|i| i.category.as_str()).collect();
    assert_eq!(categories, vec!["LOGICAL", "DATAXFER", "BINARY"]);
}

#[test]
fn test_list_page_past_end_is_empty() {
    let mut store = store();
    let _ = store.upsert_instruction(&instruction("x86_64", "ADD", None)).unwrap();
    let page = store
        .list_instructions("x86_64", PageRequest::new(5, 10), SortOrder::default())
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 1);
    assert_eq!(page.page, 5);
    assert!(!page.has_next);
}

#[test]
fn test_instruction_groups() {
    let mut store = store();
    let _ = store.upsert_instruction(&instruction("x86_64", "SUB", Some("a"))).unwrap();
    let _ = store.upsert_instruction(&instruction("x86_64", "SUB", Some("b"))).unwrap();
    let _ = store.upsert_instruction(&instruction("x86_64", "ADD", None)).unwrap();
    let _ = store
        .upsert_instruction(&described("x86_64", "MOV", "DATAXFER", "Move"))
        .unwrap();
    let _ = store
        .upsert_instruction(&described("x86_32", "AAA", "DECIMAL", "Adjust"))
        .unwrap();

    let groups = store.instruction_groups("x86_64").unwrap();
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["binary", "dataxfer"]);
    assert_eq!(groups["binary"], vec!["ADD", "SUB"]);
    assert_eq!(groups["dataxfer"], vec!["MOV"]);
    assert!(store.instruction_groups("aarch64").unwrap().is_empty());
}

#[test]
fn test_unreadable_list_columns_decode_empty() {
    let mut store = store();
    let _ = store.upsert_instruction(&instruction("x86_64", "ADD", None)).unwrap();
    let _ = store
        .connection()
        .execute(
            "UPDATE instructions SET flags_affected_json = ?1, attributes_json = ?2",
            params!["not json", "{\"a\": 1}"],
        )
        .unwrap();

    let loaded = store.get_instruction("x86_64", "ADD", None).unwrap().unwrap();
    assert!(loaded.flags_affected.is_empty());
    assert!(loaded.attributes.is_empty());
    assert_eq!(loaded.operands.len(), 2);
}

#[test]
fn test_corrupt_operands_are_a_database_error() {
    let mut store = store();
    let _ = store.upsert_instruction(&instruction("x86_64", "ADD", None)).unwrap();
    let _ = store
        .connection()
        .execute("UPDATE instructions SET operands_json = 'oops'", [])
        .unwrap();
    assert!(matches!(
        store.get_instruction("x86_64", "ADD", None),
        Err(IsaError::Database(_))
    ));
}

#[test]
fn test_encoding_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.db");
    let mut record = instruction("x86_64", "MOVZX", Some("MOVZX_GPRv_MEMb"));
    record.encoding = Some(Encoding {
        opcode: Some("0x0F 0xB6".to_owned()),
        modrm: true,
        sib: true,
        displacement: true,
        ..Encoding::from_pattern("0x0F 0xB6 MOD[mm] SIB() DISP(32)")
    });
    record.deprecated = true;
    record.added_version = Some("i386".to_owned());

    {
        let mut store = Store::open(&path).unwrap();
        let _ = store.upsert_instruction(&record).unwrap();
    }
    let reopened = Store::open(&path).unwrap();
    let loaded = reopened
        .get_instruction("x86_64", "MOVZX", Some("MOVZX_GPRv_MEMb"))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, record);
}
