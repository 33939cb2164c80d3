//! # Import Statistics Tests

use isadex_core::stats::ImportStats;

#[test]
fn test_new_is_zeroed() {
    let stats = ImportStats::new();
    assert_eq!(stats, ImportStats::default());
    assert_eq!(stats.instructions_processed, 0);
    assert!((stats.insert_ratio() - 0.0).abs() < f64::EPSILON);
}

#[test]
fn test_insert_ratio() {
    let stats = ImportStats {
        instructions_processed: 8,
        instructions_inserted: 6,
        errors: 2,
        warnings: 1,
    };
    assert!((stats.insert_ratio() - 0.75).abs() < 1e-9);
}

#[test]
fn test_summary_line() {
    let stats = ImportStats {
        instructions_processed: 3,
        instructions_inserted: 2,
        errors: 1,
        warnings: 4,
    };
    assert_eq!(stats.summary(), "processed=3 inserted=2 errors=1 warnings=4");
}

#[test]
fn test_serializes_counter_names() {
    let json = serde_json::to_value(ImportStats::new()).unwrap();
    for key in ["instructions_processed", "instructions_inserted", "errors", "warnings"] {
        assert_eq!(json[key], 0, "missing counter {key}");
    }
}
