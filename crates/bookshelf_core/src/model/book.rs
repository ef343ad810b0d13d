//! Book domain model.
//!
//! # Responsibility
//! - Define the persisted `Book` record and the `BookDraft` insert candidate.
//! - Expose field validation entry points on both shapes.
//!
//! # Invariants
//! - `BookDraft` cannot carry storage-assigned fields.
//! - `Book::version` only changes through a successful store update.

use crate::model::validation::{current_year, validate_book_fields, ValidationErrors};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage-assigned identifier of a book. Valid ids are `>= 1`.
pub type BookId = i64;

/// Page count of a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pages(pub i32);

impl Display for Pages {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} pages", self.0)
    }
}

impl ToSql for Pages {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Pages {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i32::column_result(value).map(Pages)
    }
}

/// Candidate record for insertion.
///
/// Absent fields deserialize to their zero value and are then reported by
/// validation as "must be provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookDraft {
    pub title: String,
    /// `0` means "not provided".
    pub year: i32,
    /// `Pages(0)` means "not provided".
    pub pages: Pages,
    pub genres: Vec<String>,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        year: i32,
        pages: i32,
        genres: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            year,
            pages: Pages(pages),
            genres: genres.into_iter().map(Into::into).collect(),
        }
    }

    /// Validates against the current calendar year.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(current_year())
    }

    /// Validates against an explicit `current_year` upper bound.
    pub fn validate_at(&self, current_year: i32) -> Result<(), ValidationErrors> {
        validate_book_fields(
            &self.title,
            self.year,
            self.pages,
            &self.genres,
            current_year,
        )
        .into_result()
    }
}

/// Persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// Unix epoch milliseconds. Internal; never sent to clients.
    #[serde(skip)]
    pub created_at: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "is_zero_year")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "is_zero_pages")]
    pub pages: Pages,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    /// Optimistic-concurrency token.
    pub version: i32,
}

impl Book {
    /// Validates mutable fields against the current calendar year.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(current_year())
    }

    pub fn validate_at(&self, current_year: i32) -> Result<(), ValidationErrors> {
        validate_book_fields(
            &self.title,
            self.year,
            self.pages,
            &self.genres,
            current_year,
        )
        .into_result()
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub pages: Option<Pages>,
    pub genres: Option<Vec<String>>,
}

impl BookPatch {
    /// Copies every provided field onto `book`.
    pub fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        if let Some(pages) = self.pages {
            book.pages = pages;
        }
        if let Some(genres) = self.genres {
            book.genres = genres;
        }
    }
}

fn is_zero_year(year: &i32) -> bool {
    *year == 0
}

fn is_zero_pages(pages: &Pages) -> bool {
    pages.0 == 0
}
