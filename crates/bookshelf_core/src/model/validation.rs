//! Pure validation rules for book candidates and list pagination.
//!
//! # Responsibility
//! - Check candidate fields against domain rules and report every violation.
//!
//! # Invariants
//! - No I/O. The only non-determinism is the wall-clock year, which callers
//!   can pin via the `*_at` variants.
//! - Rules never short-circuit; one candidate may yield several violations
//!   for the same field.

use crate::model::book::Pages;
use chrono::{Datelike, Utc};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TITLE_MAX_BYTES: usize = 500;
pub const EARLIEST_YEAR: i32 = 1888;
pub const GENRES_MIN: usize = 1;
pub const GENRES_MAX: usize = 5;

/// A single (field, reason) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: &'static str,
}

/// Collected violations for one candidate. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &'static str) {
        if !ok {
            self.violations.push(Violation { field, message });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Distinct offending field names in first-seen order.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        self.violations
            .iter()
            .filter(|violation| seen.insert(violation.field))
            .map(|violation| violation.field)
            .collect()
    }

    pub fn messages_for(&self, field: &str) -> Vec<&'static str> {
        self.violations
            .iter()
            .filter(|violation| violation.field == field)
            .map(|violation| violation.message)
            .collect()
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for (index, violation) in self.violations.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{} {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Current calendar year in UTC.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Checks every book rule and returns the collected violations.
pub fn validate_book_fields(
    title: &str,
    year: i32,
    pages: Pages,
    genres: &[String],
    current_year: i32,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    errors.check(!title.is_empty(), "title", "must be provided");
    errors.check(
        title.len() <= TITLE_MAX_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    errors.check(year != 0, "year", "must be provided");
    errors.check(year >= EARLIEST_YEAR, "year", "must be greater than 1888");
    errors.check(year <= current_year, "year", "must not be in the future");

    errors.check(pages.0 != 0, "pages", "must be provided");
    errors.check(pages.0 > 0, "pages", "must be a positive integer");

    errors.check(
        genres.len() >= GENRES_MIN,
        "genres",
        "must contain at least 1 genre",
    );
    errors.check(
        genres.len() <= GENRES_MAX,
        "genres",
        "must not contain more than 5 genres",
    );
    errors.check(
        all_unique(genres),
        "genres",
        "must not contain duplicate values",
    );

    errors
}

fn all_unique(values: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|value| seen.insert(value.as_str()))
}
