//! # Unit Components
//!
//! Tests grouped by the component they exercise, from the format parsers up to the import
//! driver.

/// Calling-convention, register-type, and purpose lookups.
pub mod abi;


/// Configuration defaults and JSON loading.
pub mod config;

/// Import driver, built-in importers, and audit bookkeeping.
pub mod import;


/// Import statistics counters.
pub mod stats;

/// SQLite store: upserts, lookups, search, pagination, metadata, and the audit log.
pub mod store;
