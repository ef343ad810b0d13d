//! Domain model for the book catalogue.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules pure and free of I/O.
//!
//! # Invariants
//! - `id`, `created_at` and `version` are assigned by storage only.
//! - Deletion is permanent; there are no tombstones.

pub mod book;
pub mod filters;
pub mod validation;
