//! Page requests and paged results.
//!
//! Page numbers are 1-based. A missing or zero page means the first page; a
//! missing, zero or oversized page size falls back to the default.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not send one (or sends an invalid one).
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A normalized page request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        let page = match offset {
            Some(p) if p >= 1 => p,
            _ => 1,
        };
        let per_page = match limit {
            Some(l) if (1..=MAX_PAGE_SIZE).contains(&l) => l,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, per_page }
    }

    /// First page with the given size (used for bulk walks such as exports).
    pub fn first(per_page: u32) -> Self {
        Self::new(Some(1), Some(per_page))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of items to skip.
    pub fn skip(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            per_page: self.per_page,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Slice an already-sorted collection.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.skip())
            .take(request.per_page() as usize)
            .collect();
        Self {
            items,
            total,
            page: request.page(),
            per_page: request.per_page(),
        }
    }

    /// Total number of pages (at least 1, so an empty result still has a first page).
    pub fn page_count(&self) -> u32 {
        let per_page = u64::from(self.per_page.max(1));
        let pages = self.total.div_ceil(per_page);
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}
