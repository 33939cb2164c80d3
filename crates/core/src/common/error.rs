//! Catalog error definitions.
//!
//! This module defines the failure modes that cross component boundaries. It provides:
//! 1. **Fatal-run errors:** A missing source directory or unreadable vendor file aborts an import.
//! 2. **Record errors:** Conversion and validation failures that importers count and skip.
//! 3. **Wrapped errors:** I/O, JSON, and SQLite errors propagated with `?`.
//!
//! Malformed input lines and unmapped vendor tokens are never errors; parsers skip or
//! default them locally.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by parsing, persistence, and import.
#[derive(Debug, Error)]
pub enum IsaError {
    /// Underlying filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error from the catalog store.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The import source directory does not exist.
    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A vendor register table exists but could not be read.
    #[error("failed to read register file {}: {reason}", path.display())]
    RegisterFileUnreadable {
        /// Path of the register table.
        path: PathBuf,
        /// Underlying failure message.
        reason: String,
    },

    /// A vendor field could not be converted into its canonical form.
    #[error("invalid value {value:?} for field {field}")]
    InvalidField {
        /// Vendor field name (e.g. `CPL`).
        field: &'static str,
        /// Offending raw value.
        value: String,
    },

    /// A canonical record is missing a required field.
    #[error("invalid instruction record {mnemonic:?}: missing {missing}")]
    Validation {
        /// Mnemonic of the rejected record (may be empty).
        mnemonic: String,
        /// Name of the first empty required field.
        missing: &'static str,
    },

    /// A configuration file could not be interpreted.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the catalog.
pub type Result<T> = std::result::Result<T, IsaError>;
