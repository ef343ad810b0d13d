//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `EditConflict`) in
//!   addition to storage errors.
//! - Repositories hold no in-process mutable state; write ordering is left to
//!   the database.

pub mod book_repo;
