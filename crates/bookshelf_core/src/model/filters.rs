//! Listing filters and pagination value objects.
//!
//! # Invariants
//! - An empty title or an empty genre list means "no filter".
//! - Listing order is always `id ASC`; pagination only windows that order.

use crate::model::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

pub const PAGE_MAX: u32 = 10_000_000;
pub const PAGE_SIZE_MAX: u32 = 100;
pub const PAGE_SIZE_DEFAULT: u32 = 20;

/// Row filters for listing books.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Exact, case-insensitive title match.
    pub title: Option<String>,
    /// Required genres; a match must carry all of them.
    pub genres: Vec<String>,
}

impl BookFilter {
    /// Title filter value, if one is active.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }
}

/// One-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PAGE_SIZE_DEFAULT,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(self.page > 0, "page", "must be greater than zero");
        errors.check(
            self.page <= PAGE_MAX,
            "page",
            "must be a maximum of 10 million",
        );
        errors.check(self.page_size > 0, "page_size", "must be greater than zero");
        errors.check(
            self.page_size <= PAGE_SIZE_MAX,
            "page_size",
            "must be a maximum of 100",
        );
        errors.into_result()
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// Full listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    pub filter: BookFilter,
    /// `None` returns every matching row.
    pub pagination: Option<Pagination>,
}

/// Summary of a paginated listing. All zero when nothing matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub current_page: u32,
    pub page_size: u32,
    pub first_page: u32,
    pub last_page: u32,
    pub total_records: u64,
}

impl PageMetadata {
    /// Computes metadata for `total_records` rows seen through `pagination`.
    pub fn calculate(total_records: u64, pagination: Pagination) -> Self {
        if total_records == 0 || pagination.page_size == 0 {
            return Self::default();
        }

        let page_size = u64::from(pagination.page_size);
        let last_page = total_records.div_ceil(page_size);
        Self {
            current_page: pagination.page,
            page_size: pagination.page_size,
            first_page: 1,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            total_records,
        }
    }
}
