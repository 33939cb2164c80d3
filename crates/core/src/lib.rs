//! ISA catalog ingestion library.
//!
//! This crate normalizes vendor instruction-set descriptions into one relational catalog:
//! 1. **Formats:** A block-format (XED style) tokenizer and classifier for x86, and a JSON tree walker for AArch64.
//! 2. **Model:** Canonical instruction, operand, encoding, architecture, register, and addressing-mode records.
//! 3. **Metadata:** Register-family and addressing-mode builders with calling-convention classification.
//! 4. **Store:** SQLite persistence with natural-key upserts, a synchronized FTS5 index, and pagination.
//! 5. **Import:** Importer drivers that stream records into the store and write an audit row per run.

/// Shared error type and result alias.
pub mod common;
/// Catalog configuration (storage, import, and query defaults).
pub mod config;
/// Calling-convention, register-type, and register-purpose tables.
pub mod abi;
/// Canonical data model shared by every parser and the store.
pub mod model;
/// XED block-format parser, classifier, and register metadata builder.
pub mod xed;
/// ARM JSON instruction tree walker and AArch64 metadata builder.
pub mod arm;
/// SQLite persistence and query layer.
pub mod store;
/// Import drivers and the `import_from_source` entry point.
pub mod import;
/// Per-run import statistics.
pub mod stats;

/// Crate-wide error and result types.
pub use crate::common::{IsaError, Result};
/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Import entry point and its summary type.
pub use crate::import::{ImportSummary, Importer, import_from_source};
/// Canonical instruction record.
pub use crate::model::Instruction;
/// Catalog store; open with `Store::open` or `Store::open_in_memory`.
pub use crate::store::Store;
