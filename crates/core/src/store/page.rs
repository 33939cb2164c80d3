//! Pagination and sort-order types for list and search queries.

use serde::{Deserialize, Serialize};

/// A requested page. Values are normalized by the store before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number; zero is treated as the first page.
    pub page: u32,
    /// Requested page size; `None` uses the configured default.
    pub page_size: Option<u32>,
}

impl PageRequest {
    /// Requests `page` with an explicit size.
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: Some(page_size),
        }
    }

    /// Requests the first page with the default size.
    pub const fn first() -> Self {
        Self {
            page: 1,
            page_size: None,
        }
    }

    /// Clamps the request to `page >= 1` and `1 <= size <= max_size`.
    ///
    /// # Arguments
    ///
    /// * `default_size` - Size used when none was requested.
    /// * `max_size` - Upper bound for any page size.
    ///
    /// # Returns
    ///
    /// `(page, page_size)` with both values at least 1.
    pub fn normalized(self, default_size: u32, max_size: u32) -> (u32, u32) {
        let max_size = max_size.max(1);
        let size = self.page_size.unwrap_or(default_size).clamp(1, max_size);
        (self.page.max(1), size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of results plus the totals needed to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Matching rows across all pages.
    pub total_items: u64,
    /// 1-based page number actually served.
    pub page: u32,
    /// Page size actually used.
    pub page_size: u32,
    /// `ceil(total_items / page_size)`.
    pub total_pages: u64,
    /// A later page exists.
    pub has_next: bool,
    /// An earlier page exists.
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Assembles a page and derives the navigation fields.
    pub fn new(items: Vec<T>, total_items: u64, page: u32, page_size: u32) -> Self {
        let size = u64::from(page_size.max(1));
        let total_pages = total_items.div_ceil(size);
        Self {
            items,
            total_items,
            page,
            page_size,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }

    /// A page with no rows.
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), 0, page, page_size)
    }

    /// Row offset of this page.
    pub fn offset(page: u32, page_size: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(page_size)
    }
}

/// Whitelisted instruction sort columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Sort by mnemonic.
    #[default]
    Mnemonic,
    /// Sort by category.
    Category,
    /// Sort by extension.
    Extension,
    /// Sort by instruction-set tag.
    IsaSet,
    /// Sort by description.
    Description,
}

impl SortKey {
    /// Column name; only these strings ever reach SQL.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Mnemonic => "mnemonic",
            Self::Category => "category",
            Self::Extension => "extension",
            Self::IsaSet => "isa_set",
            Self::Description => "description",
        }
    }

    /// Parses a user-supplied key, falling back to [`SortKey::Mnemonic`].
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "category" => Self::Category,
            "extension" => Self::Extension,
            "isa_set" => Self::IsaSet,
            "description" => Self::Description,
            _ => Self::Mnemonic,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// SQL keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parses `asc`/`desc` case-insensitively; anything else is ascending.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortOrder {
    /// Column.
    pub key: SortKey,
    /// Direction.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Creates a sort order.
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// `ORDER BY` body; ties break on row id so pages are stable.
    pub fn clause(self) -> String {
        format!("{} {}, id ASC", self.key.column(), self.direction.keyword())
    }
}
