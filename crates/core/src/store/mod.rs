//! SQLite persistence and query layer.
//!
//! This module owns the catalog database. It provides:
//! 1. **Schema:** Tables, natural-key unique indexes, and the FTS5 mirror ([`schema`]).
//! 2. **Instructions:** Natural-key upserts, lookups, paginated listing, and ranked search.
//! 3. **Metadata:** Architecture, register-forest, and addressing-mode persistence and queries.
//! 4. **Audit:** Append-only import-run log.
//!
//! Every upsert runs in its own transaction; [`Store::persist_metadata`] writes a whole bundle
//! in one.

use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::common::Result;
use crate::config::QueryConfig;

mod audit;
mod instructions;
mod metadata;
/// Pagination and sort types.
pub mod page;
/// Schema definition.
pub mod schema;

pub use instructions::match_expression;
pub use metadata::{MetadataCounts, RegisterView};
pub use page::{Page, PageRequest, SortDirection, SortKey, SortOrder};

/// Handle to one catalog database.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    query: QueryConfig,
}

impl Store {
    /// Opens (creating if needed) a database file and ensures the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening catalog database");
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            query: QueryConfig::default(),
        })
    }

    /// Replaces the query defaults (page sizes, search cap).
    #[must_use]
    pub const fn with_query_config(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    /// Query defaults in effect.
    pub const fn query_config(&self) -> QueryConfig {
        self.query
    }

    /// Underlying connection, for ad-hoc inspection.
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    fn normalize(&self, request: PageRequest) -> (u32, u32) {
        request.normalized(self.query.default_page_size, self.query.max_page_size)
    }
}

/// Decodes a JSON column, mapping failures to a column conversion error.
fn decode_json<T: DeserializeOwned>(text: &str, column: usize) -> rusqlite::Result<T> {
    serde_json::from_str(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Decodes a JSON string list; unreadable content decodes as empty.
fn decode_list(text: &str) -> Vec<String> {
    serde_json::from_str(text).unwrap_or_default()
}

/// Converts a stored count to `u64`; SQLite never returns a negative `COUNT`.
fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
