//! Page-number pagination shared by every listing endpoint.

use serde::Serialize;

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// A validated page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

/// Reason a page request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequestError {
    /// Page numbers start at 1.
    ZeroPage,
    /// A page must hold at least one item.
    ZeroPerPage,
}

impl std::fmt::Display for PageRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageRequestError::ZeroPage => write!(f, "page must be at least 1"),
            PageRequestError::ZeroPerPage => write!(f, "per_page must be at least 1"),
        }
    }
}

impl std::error::Error for PageRequestError {}

impl PageRequest {
    /// Builds a page request; `per_page` is capped at [`MAX_PER_PAGE`].
    pub fn new(page: u32, per_page: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if per_page == 0 {
            return Err(PageRequestError::ZeroPerPage);
        }
        Ok(Self {
            page,
            per_page: per_page.min(MAX_PER_PAGE),
        })
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of rows to skip.
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Number of rows to take.
    pub const fn limit(&self) -> u64 {
        self.per_page as u64
    }

    /// Slices an in-memory, already ordered collection.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.per_page as usize)
            .collect();
        Page::new(items, *self, total)
    }
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(request, total),
        }
    }

    /// Converts every item while keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Pagination metadata as rendered in list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            per_page: request.per_page,
            total,
            pages: total.div_ceil(u64::from(request.per_page)),
        }
    }
}
