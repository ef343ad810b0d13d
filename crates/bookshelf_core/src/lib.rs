//! Core record management for the bookshelf catalogue.
//! This crate owns the book schema, validation rules and the
//! optimistic-concurrency contract for updates.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::book::{Book, BookDraft, BookId, BookPatch, Pages};
pub use model::filters::{BookFilter, BookListQuery, PageMetadata, Pagination};
pub use model::validation::{ValidationErrors, Violation};
pub use repo::book_repo::{BookRepository, SqliteBookRepository, StoreError, StoreResult};
pub use service::book_service::{
    BookListResult, BookService, BookServiceError, BookServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
