//! This modules defines the common functionality for paging data.

use serde::Serialize;

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page size to use when a request does not specify one.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A validated request for one page of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The 1-based page number.
    pub page: u64,
    /// The maximum number of items on a page.
    pub limit: u64,
}

impl PageRequest {
    /// Validate the raw `page` and `limit` query parameters.
    ///
    /// Missing values fall back to the first page and the configured default page size.
    ///
    /// # Errors
    /// Returns [Error::InvalidPage] if `page` is less than one, [Error::InvalidLimit] if
    /// `limit` is not between one and the configured maximum page size, or
    /// [Error::PageTooLarge] if the items before `page` could not be skipped in a query.
    pub fn new(
        page: Option<i64>,
        limit: Option<i64>,
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let page = match page {
            None => 1,
            Some(page) if page >= 1 => page as u64,
            Some(_) => return Err(Error::InvalidPage),
        };

        let limit = match limit {
            None => config.default_page_size,
            Some(limit) if limit >= 1 && limit as u64 <= config.max_page_size => limit as u64,
            Some(_) => return Err(Error::InvalidLimit(config.max_page_size)),
        };

        // SQLite takes the offset as a signed 64-bit integer.
        let max_page = i64::MAX as u64 / limit + 1;
        if page > max_page {
            return Err(Error::PageTooLarge(max_page));
        }

        Ok(Self { page, limit })
    }

    /// The number of items that come before this page, clamped to what SQLite accepts.
    pub fn offset(&self) -> i64 {
        let offset = (self.page - 1).saturating_mul(self.limit);

        i64::try_from(offset).unwrap_or(i64::MAX)
    }
}

/// Describes where a page sits within the full list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: u64,
}

impl Pagination {
    /// Describe the page `request` for a list with `total` items.
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(request.limit);

        Self {
            current_page: request.page,
            total_pages,
            total,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
            limit: request.limit,
        }
    }
}

/// One page of items along with the pagination details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(request, total),
        }
    }
}
