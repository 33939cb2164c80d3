//! Configuration for the ISA catalog.
//!
//! This module defines the settings that parameterize storage, import, and queries. It provides:
//! 1. **Defaults:** Baseline constants (database path, progress interval, page sizes).
//! 2. **Structures:** Hierarchical config for storage, import, and query behavior.
//!
//! Configuration is supplied as JSON via [`Config::from_json_file`] or use `Config::default()`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::{IsaError, Result};

/// Default configuration constants for the catalog.
mod defaults {
    /// SQLite database file created in the working directory.
    pub const DATABASE_PATH: &str = "isa_docs.db";

    /// Number of processed records between progress log lines.
    pub const PROGRESS_INTERVAL: u64 = 100;

    /// Page size used when a caller does not request one.
    pub const DEFAULT_PAGE_SIZE: u32 = 50;

    /// Upper bound applied to every requested page size.
    ///
    /// Larger requests are clamped rather than rejected.
    pub const MAX_PAGE_SIZE: u32 = 500;

    /// Result cap for unpaginated search.
    pub const SEARCH_LIMIT: u32 = 50;
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage location settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Import behavior
    #[serde(default)]
    pub import: ImportConfig,
    /// Query defaults and limits
    #[serde(default)]
    pub query: QueryConfig,
}

impl Config {
    /// Loads configuration from a JSON file; missing fields take their defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a JSON document shaped like [`Config`].
    ///
    /// # Returns
    ///
    /// The parsed configuration, or an error if the file is unreadable or malformed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| IsaError::Config(format!("{}: {e}", path.display())))
    }
}

/// Storage location settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file path
    #[serde(default = "StorageConfig::default_database_path")]
    pub database_path: PathBuf,
}

impl StorageConfig {
    fn default_database_path() -> PathBuf {
        PathBuf::from(defaults::DATABASE_PATH)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: Self::default_database_path(),
        }
    }
}

/// Import behavior settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// XED source tree (directory holding `datafiles/` or the datafiles themselves)
    #[serde(default)]
    pub xed_source_dir: Option<PathBuf>,

    /// Directory holding the ARM `Instructions.json` document
    #[serde(default)]
    pub arm_source_dir: Option<PathBuf>,

    /// Skip architecture/register/addressing-mode import
    #[serde(default)]
    pub skip_metadata: bool,

    /// Records between progress log lines; zero disables progress logging
    #[serde(default = "ImportConfig::default_progress_interval")]
    pub progress_interval: u64,
}

impl ImportConfig {
    fn default_progress_interval() -> u64 {
        defaults::PROGRESS_INTERVAL
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            xed_source_dir: None,
            arm_source_dir: None,
            skip_metadata: false,
            progress_interval: defaults::PROGRESS_INTERVAL,
        }
    }
}

/// Query defaults and limits.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QueryConfig {
    /// Page size when none is requested
    #[serde(default = "QueryConfig::default_page_size")]
    pub default_page_size: u32,

    /// Largest page size honored; bigger requests are clamped
    #[serde(default = "QueryConfig::default_max_page_size")]
    pub max_page_size: u32,

    /// Result cap for unpaginated search
    #[serde(default = "QueryConfig::default_search_limit")]
    pub search_limit: u32,
}

impl QueryConfig {
    fn default_page_size() -> u32 {
        defaults::DEFAULT_PAGE_SIZE
    }

    fn default_max_page_size() -> u32 {
        defaults::MAX_PAGE_SIZE
    }

    fn default_search_limit() -> u32 {
        defaults::SEARCH_LIMIT
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: defaults::DEFAULT_PAGE_SIZE,
            max_page_size: defaults::MAX_PAGE_SIZE,
            search_limit: defaults::SEARCH_LIMIT,
        }
    }
}
