//! Scoped per-operation deadline for SQLite calls.
//!
//! # Responsibility
//! - Bound lock waits (`busy_timeout`) and statement execution (progress
//!   handler interrupt) for a single storage operation.
//! - Translate aborted statements into `DbError::Timeout`.
//!
//! # Invariants
//! - At most one deadline is armed per connection at a time; the guard
//!   borrows the connection for its whole lifetime.
//! - Dropping the guard always restores the lock-wait bound the connection
//!   had before arming, whichever path the operation exits through.
//! - Only waits that actually ran to the limit are reported as timeouts; an
//!   immediate `SQLITE_BUSY` stays a plain SQLite error.

use super::{DbError, DbResult};
use rusqlite::{Connection, ErrorCode};
use std::time::{Duration, Instant};

/// VM instructions between deadline checks.
const PROGRESS_CHECK_OPS: i32 = 100;

/// Armed deadline for one storage operation.
pub struct OperationDeadline<'conn> {
    conn: &'conn Connection,
    limit: Duration,
    armed_at: Instant,
    restore_busy_timeout: Duration,
}

impl<'conn> OperationDeadline<'conn> {
    /// Arms a deadline of `limit` starting now.
    pub fn arm(conn: &'conn Connection, limit: Duration) -> DbResult<Self> {
        let restore_busy_timeout = current_busy_timeout(conn)?;
        let armed_at = Instant::now();
        let expires_at = armed_at + limit;
        conn.busy_timeout(limit)?;
        conn.progress_handler(
            PROGRESS_CHECK_OPS,
            Some(move || Instant::now() >= expires_at),
        );
        Ok(Self {
            conn,
            limit,
            armed_at,
            restore_busy_timeout,
        })
    }

    /// Returns the configured limit of this deadline.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Maps a SQLite failure raised under this deadline.
    ///
    /// Interrupts and lock waits that ran out the limit become
    /// `DbError::Timeout`. SQLite may refuse a lock without waiting (deadlock
    /// avoidance); that busy error is kept as `DbError::Sqlite`.
    pub fn classify(&self, err: rusqlite::Error) -> DbError {
        match err.sqlite_error_code() {
            Some(ErrorCode::OperationInterrupted) => DbError::Timeout(self.limit),
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
                if self.armed_at.elapsed() >= self.limit =>
            {
                DbError::Timeout(self.limit)
            }
            _ => DbError::Sqlite(err),
        }
    }
}

impl Drop for OperationDeadline<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
        let _ = self.conn.busy_timeout(self.restore_busy_timeout);
    }
}

fn current_busy_timeout(conn: &Connection) -> DbResult<Duration> {
    let millis: i64 = conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))?;
    Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
}
