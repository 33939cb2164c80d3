//! Import statistics collection and reporting.
//!
//! This module tracks per-run counters for an import attempt. It provides:
//! 1. **Counters:** Records processed and inserted, record-level errors, and warnings.
//! 2. **Reporting:** A one-line summary for logs and a sectioned report for the terminal.

use serde::Serialize;

/// Counters accumulated over one import attempt.
///
/// Partial success is the normal case: `errors` counts skipped records, not run failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Canonical records pulled from the parser.
    pub instructions_processed: u64,
    /// Records persisted (inserted or replaced).
    pub instructions_inserted: u64,
    /// Records rejected by validation, conversion, or persistence.
    pub errors: u64,
    /// Non-fatal anomalies (skipped nodes, missing optional files).
    pub warnings: u64,
}

impl ImportStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of processed records that were persisted, in `[0, 1]`.
    pub fn insert_ratio(&self) -> f64 {
        if self.instructions_processed == 0 {
            0.0
        } else {
            self.instructions_inserted as f64 / self.instructions_processed as f64
        }
    }

    /// Single-line summary suitable for a log field.
    pub fn summary(&self) -> String {
        format!(
            "processed={} inserted={} errors={} warnings={}",
            self.instructions_processed, self.instructions_inserted, self.errors, self.warnings
        )
    }

    /// Prints a report to stdout.
    pub fn print(&self, isa: &str, duration_seconds: f64) {
        println!("\n==========================================================");
        println!("IMPORT STATISTICS: {isa}");
        println!("==========================================================");
        println!("duration                 {duration_seconds:.3} s");
        println!("processed                {}", self.instructions_processed);
        println!("inserted                 {}", self.instructions_inserted);
        println!("insert_ratio             {:.2}%", self.insert_ratio() * 100.0);
        println!("errors                   {}", self.errors);
        println!("warnings                 {}", self.warnings);
        println!("----------------------------------------------------------");
    }
}
