//! Pagination envelope and parameters for search results.
//!
//! [`PaginationParams`] normalizes the caller's raw `page`/`limit` into a skip/limit pair,
//! and [`Page`] is the envelope returned by paginated searches.

use serde::{Deserialize, Serialize};

/// A single page of search results.
///
/// `count` is the number of documents matching the filter, not the length of `data`, and
/// `pages` is always `ceil(count / limit)`.
///
/// # Example
///
/// ```ignore
/// use docrepo::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_page(1)
///     .with_limit(10)
///     .with_count(21)
///     .build();
///
/// assert_eq!(page.pages, 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// 1-based.
    pub page: i64,
    /// Maximum number of documents per page.
    pub limit: i64,
    /// Documents matching the filter, over all pages.
    pub count: u64,
    /// Number of pages needed to hold `count` documents.
    pub pages: u64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Starts a page around `data`.
    pub fn builder(data: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(data)
    }
}

/// Number of pages needed for `count` items at `limit` items per page.
pub fn page_count(count: u64, limit: i64) -> u64 {
    match u64::try_from(limit) {
        Ok(limit) if limit > 0 => count.div_ceil(limit),
        _ => 0,
    }
}

/// Collects page metadata; [`build`](Self::build) derives `pages`.
pub struct PageBuilder<T> {
    data: Vec<T>,
    page: i64,
    limit: i64,
    count: u64,
}

impl<T> PageBuilder<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            page: 1,
            limit: PaginationParams::DEFAULT_LIMIT,
            count: 0,
        }
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the total count of matching documents.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    /// Takes page and limit from normalized parameters.
    pub fn with_params(self, params: &PaginationParams) -> Self {
        self.with_page(params.page)
            .with_limit(params.limit)
    }

    /// Builds the [`Page`], deriving the page count.
    pub fn build(self) -> Page<T> {
        Page {
            page: self.page,
            limit: self.limit,
            count: self.count,
            pages: page_count(self.count, self.limit),
            data: self.data,
        }
    }
}

/// Normalized pagination parameters.
///
/// Pages are 1-indexed. A page of zero or less skips nothing.
///
/// # Example
///
/// ```ignore
/// use docrepo::page::PaginationParams;
///
/// let params = PaginationParams::from_raw(Some(3), Some(20), 50);
/// assert_eq!(params.offset(), 40);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// The page number.
    pub page: i64,
    /// Number of documents per page, always positive.
    pub limit: i64,
}

impl PaginationParams {
    pub const DEFAULT_LIMIT: i64 = 50;

    /// Normalizes raw parameters.
    ///
    /// An unset or non-positive `limit` falls back to `default_limit`, and an unset or zero
    /// `page` falls back to 1. Negative pages are kept as given.
    pub fn from_raw(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        let default_limit = if default_limit > 0 { default_limit } else { Self::DEFAULT_LIMIT };

        Self {
            page: page.filter(|page| *page != 0).unwrap_or(1),
            limit: limit.filter(|limit| *limit > 0).unwrap_or(default_limit),
        }
    }

    /// Number of documents to skip for this page, saturating for pages far past the end.
    pub fn offset(&self) -> u64 {
        if self.page > 0 {
            (self.page as u64 - 1).saturating_mul(self.limit as u64)
        } else {
            0
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, limit: Self::DEFAULT_LIMIT }
    }
}
