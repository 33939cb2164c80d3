//! Import audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One import attempt, success or failure. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRun {
    /// Row id; `None` before the row is written.
    pub id: Option<i64>,
    /// Importer ISA name (e.g. `x86_32,x86_64`).
    pub isa: String,
    /// Source directory as given to the importer.
    pub source_path: String,
    /// When the attempt finished.
    pub timestamp: DateTime<Utc>,
    /// Records persisted before the run ended.
    pub instruction_count: u64,
    /// Vendor data version, when known.
    pub source_version: Option<String>,
    /// Importer code version.
    pub importer_version: String,
    /// Wall-clock duration of the attempt.
    pub duration_seconds: f64,
    /// Whether the run completed.
    pub success: bool,
    /// Fatal error message for failed runs.
    pub error_message: Option<String>,
}
