//! # Configuration Tests
//!
//! Defaults, partial JSON documents, and malformed input.

use std::fs;
use std::path::PathBuf;

use isadex_core::IsaError;
use isadex_core::config::*;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.storage.database_path, PathBuf::from("isa_docs.db"));
    assert_eq!(config.import.progress_interval, 100);
    assert!(!config.import.skip_metadata);
    assert!(config.import.xed_source_dir.is_none());
    assert!(config.import.arm_source_dir.is_none());
}

#[test]
fn test_query_config_defaults() {
    let query = QueryConfig::default();
    assert_eq!(query.default_page_size, 50);
    assert_eq!(query.max_page_size, 500);
    assert_eq!(query.search_limit, 50);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "import": { "xed_source_dir": "/opt/xed", "skip_metadata": true } }"#,
    )
    .unwrap();

    let config = Config::from_json_file(&path).unwrap();
    assert_eq!(config.import.xed_source_dir, Some(PathBuf::from("/opt/xed")));
    assert!(config.import.skip_metadata);
    assert_eq!(config.import.progress_interval, 100);
    assert_eq!(config.storage.database_path, PathBuf::from("isa_docs.db"));
    assert_eq!(config.query.max_page_size, 500);
}

#[test]
fn test_full_json_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "storage": { "database_path": "catalog.sqlite" },
            "import": { "progress_interval": 0 },
            "query": { "default_page_size": 10, "max_page_size": 20, "search_limit": 5 }
        }"#,
    )
    .unwrap();

    let config = Config::from_json_file(&path).unwrap();
    assert_eq!(config.storage.database_path, PathBuf::from("catalog.sqlite"));
    assert_eq!(config.import.progress_interval, 0);
    assert_eq!(config.query.default_page_size, 10);
    assert_eq!(config.query.max_page_size, 20);
    assert_eq!(config.query.search_limit, 5);
}

#[test]
fn test_malformed_json_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let err = Config::from_json_file(&path).unwrap_err();
    assert!(matches!(err, IsaError::Config(_)));
    assert!(err.to_string().contains("config.json"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Config::from_json_file(&PathBuf::from("/nonexistent/isadex.json")).unwrap_err();
    assert!(matches!(err, IsaError::Io(_)));
}
