//! SQLite storage bootstrap, schema migrations and operation deadlines.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the bookshelf core.
//! - Apply schema migrations in deterministic order.
//! - Bound every storage operation with a scoped deadline.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write book data before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

mod deadline;
pub mod migrations;
mod open;

pub use deadline::OperationDeadline;
pub use open::{open_db, open_db_in_memory, open_db_with_config};

/// Lock-wait bound a connection is opened with when no config is given.
pub const DEFAULT_BUSY_TIMEOUT: Duration =
    Duration::from_millis(crate::config::DEFAULT_BUSY_TIMEOUT_MS);

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure. Everything here surfaces as a storage error to
/// callers of the record store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Connection was handed to a repository before migrations ran.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Operation exceeded its deadline and was aborted.
    Timeout(Duration),
    /// Persisted row cannot be decoded into a valid record.
    CorruptRow(String),
}

impl DbError {
    /// Returns whether this failure was caused by an expired deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "book repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Timeout(limit) => {
                write!(f, "storage operation exceeded {}ms deadline", limit.as_millis())
            }
            Self::CorruptRow(message) => write!(f, "invalid persisted book data: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::UninitializedConnection { .. }
            | Self::Timeout(_)
            | Self::CorruptRow(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
