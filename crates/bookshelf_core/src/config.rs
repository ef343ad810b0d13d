//! Store configuration.
//!
//! # Invariants
//! - Timeouts are interpreted as milliseconds.
//! - A missing `db_path` selects an in-memory database.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default per-operation deadline for record store calls.
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 3_000;
/// Default lock-wait bound for idle connections.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration for opening the book database and bounding store calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: Option<PathBuf>,
    /// Busy timeout applied to connections outside of store operations.
    pub busy_timeout_ms: u64,
    /// Deadline applied to each record store operation.
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// Default configuration targeting the database file at `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Parses configuration from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_OPERATION_TIMEOUT_MS};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.operation_timeout_ms, DEFAULT_OPERATION_TIMEOUT_MS);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config = StoreConfig::from_json_str(
            r#"{"db_path": "/var/lib/bookshelf/books.db", "operation_timeout_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/bookshelf/books.db"))
        );
        assert_eq!(config.operation_timeout(), Duration::from_millis(250));
        assert_eq!(config.busy_timeout(), Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = StoreConfig::from_json_str(r#"{"timeout": 5}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }
}
