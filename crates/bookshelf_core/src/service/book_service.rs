//! Book use-case service.
//!
//! # Responsibility
//! - Validate candidates before any write reaches the repository.
//! - Provide create/get/update/patch/delete/list entry points for callers.
//! - Build page metadata for paginated listings.
//!
//! # Invariants
//! - No write is attempted for a candidate with validation violations.
//! - Service APIs never retry `EditConflict`; callers re-fetch and decide.

use crate::db::DbError;
use crate::model::book::{Book, BookDraft, BookId, BookPatch};
use crate::model::filters::{BookListQuery, PageMetadata};
use crate::model::validation::ValidationErrors;
use crate::repo::book_repo::{BookRepository, StoreError};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for book use-cases.
#[derive(Debug)]
pub enum BookServiceError {
    /// Candidate input broke one or more domain rules.
    Validation(ValidationErrors),
    /// Target book does not exist.
    NotFound(BookId),
    /// Caller's version is stale.
    EditConflict { id: BookId, version: i32 },
    /// Persistence-layer failure, including timeouts.
    Storage(DbError),
}

impl Display for BookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::EditConflict { id, version } => write!(
                f,
                "unable to update book {id}: version {version} was edited concurrently"
            ),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::EditConflict { .. } => None,
        }
    }
}

impl From<StoreError> for BookServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::EditConflict { id, version } => Self::EditConflict { id, version },
            StoreError::Storage(err) => Self::Storage(err),
        }
    }
}

impl From<ValidationErrors> for BookServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

pub type BookServiceResult<T> = Result<T, BookServiceError>;

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListResult {
    /// Items ordered by `id ASC`.
    pub items: Vec<Book>,
    /// Present only for paginated queries.
    pub metadata: Option<PageMetadata>,
}

/// Book service facade over repository implementations.
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and persists a new book.
    pub fn create_book(&self, draft: BookDraft) -> BookServiceResult<Book> {
        if let Err(errors) = draft.validate() {
            debug!(
                "event=book_create module=service status=invalid fields={}",
                errors.fields().join(",")
            );
            return Err(errors.into());
        }

        let book = self.repo.insert_book(&draft)?;
        debug!(
            "event=book_create module=service status=ok id={} version={}",
            book.id, book.version
        );
        Ok(book)
    }

    pub fn get_book(&self, id: BookId) -> BookServiceResult<Book> {
        Ok(self.repo.get_book(id)?)
    }

    /// Validates `book` and writes it if `book.version` is still current.
    ///
    /// On success `book.version` is advanced to the stored version.
    pub fn update_book(&self, book: &mut Book) -> BookServiceResult<()> {
        book.validate()?;

        match self.repo.update_book(book) {
            Ok(version) => {
                debug!(
                    "event=book_update module=service status=ok id={} version={}",
                    book.id, version
                );
                book.version = version;
                Ok(())
            }
            Err(StoreError::EditConflict { id, version }) => {
                warn!(
                    "event=book_update module=service status=conflict id={id} stale_version={version}"
                );
                Err(BookServiceError::EditConflict { id, version })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Applies a partial update to the stored book.
    ///
    /// # Contract
    /// - When `expected_version` is set and differs from the stored version,
    ///   fails with `EditConflict` without writing.
    /// - Fields absent from `patch` keep their stored values.
    /// - The merged record is validated as a whole before writing.
    pub fn patch_book(
        &self,
        id: BookId,
        patch: BookPatch,
        expected_version: Option<i32>,
    ) -> BookServiceResult<Book> {
        let mut book = self.repo.get_book(id)?;

        if let Some(expected) = expected_version {
            if expected != book.version {
                warn!(
                    "event=book_patch module=service status=conflict id={id} expected_version={expected} stored_version={}",
                    book.version
                );
                return Err(BookServiceError::EditConflict {
                    id,
                    version: expected,
                });
            }
        }

        patch.apply_to(&mut book);
        self.update_book(&mut book)?;
        Ok(book)
    }

    pub fn delete_book(&self, id: BookId) -> BookServiceResult<()> {
        self.repo.delete_book(id)?;
        debug!("event=book_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Lists books, attaching page metadata for paginated queries.
    pub fn list_books(&self, query: &BookListQuery) -> BookServiceResult<BookListResult> {
        let Some(pagination) = query.pagination else {
            let items = self.repo.list_books(query)?;
            return Ok(BookListResult {
                items,
                metadata: None,
            });
        };

        pagination.validate()?;
        let items = self.repo.list_books(query)?;
        let total = self.repo.count_books(&query.filter)?;
        Ok(BookListResult {
            items,
            metadata: Some(PageMetadata::calculate(total, pagination)),
        })
    }
}
