//! Book repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over the `books` table.
//! - Enforce optimistic concurrency on update via the `version` column.
//!
//! # Invariants
//! - `id < 1` is answered with `NotFound` before any SQL runs.
//! - Update is a single conditional statement keyed by `(id, version)`;
//!   a missing row or a stale version both surface as `EditConflict`.
//! - Every operation runs under an `OperationDeadline` and never retries.
//! - This layer does not validate or log; callers own both.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, OperationDeadline};
use crate::model::book::{Book, BookDraft, BookId, Pages};
use crate::model::filters::{BookFilter, BookListQuery};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    created_at,
    title,
    year,
    pages,
    genres,
    version
FROM books";

/// Default deadline for one repository call.
pub const DEFAULT_OPERATION_TIMEOUT: Duration =
    Duration::from_millis(crate::config::DEFAULT_OPERATION_TIMEOUT_MS);

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store failure.
#[derive(Debug)]
pub enum StoreError {
    /// No record with this id.
    NotFound(BookId),
    /// The row is gone or no longer carries `version`; re-fetch and retry.
    EditConflict { id: BookId, version: i32 },
    /// Backend, connectivity or timeout failure.
    Storage(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::EditConflict { id, version } => write!(
                f,
                "edit conflict on book {id}: version {version} is no longer current"
            ),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::EditConflict { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

/// Repository interface for book persistence.
pub trait BookRepository {
    /// Persists a new row; storage assigns `id`, `created_at`, `version = 1`.
    fn insert_book(&self, draft: &BookDraft) -> StoreResult<Book>;
    fn get_book(&self, id: BookId) -> StoreResult<Book>;
    /// Replaces mutable fields when `book.version` is still current.
    ///
    /// Returns the new version.
    fn update_book(&self, book: &Book) -> StoreResult<i32>;
    /// Removes the row regardless of its version.
    fn delete_book(&self, id: BookId) -> StoreResult<()>;
    /// Lists matching rows ordered by `id ASC`.
    fn list_books(&self, query: &BookListQuery) -> StoreResult<Vec<Book>>;
    /// Counts rows matching `filter`, ignoring pagination.
    fn count_books(&self, filter: &BookFilter) -> StoreResult<u64>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
    timeout: Duration,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual_version = current_user_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(DbError::UninitializedConnection {
                expected_version,
                actual_version,
            }
            .into());
        }

        Ok(Self {
            conn,
            timeout: DEFAULT_OPERATION_TIMEOUT,
        })
    }

    /// Replaces the per-operation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn arm_deadline(&self) -> StoreResult<OperationDeadline<'conn>> {
        Ok(OperationDeadline::arm(self.conn, self.timeout)?)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn insert_book(&self, draft: &BookDraft) -> StoreResult<Book> {
        let genres = encode_genres(&draft.genres)?;
        let deadline = self.arm_deadline()?;

        let (id, created_at, version) = self
            .conn
            .query_row(
                "INSERT INTO books (title, title_folded, year, pages, genres)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id, created_at, version;",
                params![
                    draft.title.as_str(),
                    fold_title(&draft.title),
                    draft.year,
                    draft.pages,
                    genres,
                ],
                |row| {
                    Ok((
                        row.get::<_, BookId>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i32>(2)?,
                    ))
                },
            )
            .map_err(|err| deadline.classify(err))?;

        Ok(Book {
            id,
            created_at,
            title: draft.title.clone(),
            year: draft.year,
            pages: draft.pages,
            genres: draft.genres.clone(),
            version,
        })
    }

    fn get_book(&self, id: BookId) -> StoreResult<Book> {
        if id < 1 {
            return Err(StoreError::NotFound(id));
        }

        let deadline = self.arm_deadline()?;
        let row = self
            .conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE id = ?1;"),
                [id],
                read_book_row,
            )
            .optional()
            .map_err(|err| deadline.classify(err))?;

        match row {
            Some(row) => Ok(row.into_book()?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn update_book(&self, book: &Book) -> StoreResult<i32> {
        if book.id < 1 {
            return Err(StoreError::NotFound(book.id));
        }

        let genres = encode_genres(&book.genres)?;
        let deadline = self.arm_deadline()?;

        let new_version = self
            .conn
            .query_row(
                "UPDATE books
                 SET
                    title = ?1,
                    title_folded = ?2,
                    year = ?3,
                    pages = ?4,
                    genres = ?5,
                    version = version + 1
                 WHERE id = ?6
                   AND version = ?7
                 RETURNING version;",
                params![
                    book.title.as_str(),
                    fold_title(&book.title),
                    book.year,
                    book.pages,
                    genres,
                    book.id,
                    book.version,
                ],
                |row| row.get::<_, i32>(0),
            )
            .optional()
            .map_err(|err| deadline.classify(err))?;

        new_version.ok_or(StoreError::EditConflict {
            id: book.id,
            version: book.version,
        })
    }

    fn delete_book(&self, id: BookId) -> StoreResult<()> {
        if id < 1 {
            return Err(StoreError::NotFound(id));
        }

        let deadline = self.arm_deadline()?;
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1;", [id])
            .map_err(|err| deadline.classify(err))?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn list_books(&self, query: &BookListQuery) -> StoreResult<Vec<Book>> {
        let (mut sql, mut bind_values) = filtered_sql(BOOK_SELECT_SQL, &query.filter);
        sql.push_str(" ORDER BY id ASC");

        if let Some(pagination) = query.pagination {
            sql.push_str(" LIMIT ? OFFSET ?");
            bind_values.push(Value::Integer(pagination.limit()));
            bind_values.push(Value::Integer(pagination.offset()));
        }

        let deadline = self.arm_deadline()?;
        let rows = collect_rows(self.conn, &sql, bind_values).map_err(|err| deadline.classify(err))?;
        drop(deadline);

        rows.into_iter()
            .map(|row| row.into_book().map_err(StoreError::from))
            .collect()
    }

    fn count_books(&self, filter: &BookFilter) -> StoreResult<u64> {
        let (sql, bind_values) = filtered_sql("SELECT COUNT(*) FROM books", filter);

        let deadline = self.arm_deadline()?;
        let total = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get::<_, i64>(0))
            .map_err(|err| deadline.classify(err))?;

        u64::try_from(total)
            .map_err(|_| DbError::CorruptRow(format!("negative row count `{total}`")).into())
    }
}

/// Raw column values of one `books` row.
struct BookRow {
    id: BookId,
    created_at: i64,
    title: String,
    year: i32,
    pages: Pages,
    genres_json: String,
    version: i32,
}

impl BookRow {
    fn into_book(self) -> Result<Book, DbError> {
        let genres = serde_json::from_str::<Vec<String>>(&self.genres_json).map_err(|err| {
            DbError::CorruptRow(format!(
                "invalid genres value `{}` in books.genres for id {}: {err}",
                self.genres_json, self.id
            ))
        })?;

        Ok(Book {
            id: self.id,
            created_at: self.created_at,
            title: self.title,
            year: self.year,
            pages: self.pages,
            genres,
            version: self.version,
        })
    }
}

fn read_book_row(row: &Row<'_>) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        id: row.get("id")?,
        created_at: row.get("created_at")?,
        title: row.get("title")?,
        year: row.get("year")?,
        pages: row.get("pages")?,
        genres_json: row.get("genres")?,
        version: row.get("version")?,
    })
}

fn collect_rows(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> rusqlite::Result<Vec<BookRow>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut books = Vec::new();
    while let Some(row) = rows.next()? {
        books.push(read_book_row(row)?);
    }
    Ok(books)
}

/// Appends `WHERE` clauses for `filter` to `select`.
fn filtered_sql(select: &str, filter: &BookFilter) -> (String, Vec<Value>) {
    let mut sql = format!("{select} WHERE 1 = 1");
    let mut bind_values = Vec::new();

    if let Some(title) = filter.title() {
        sql.push_str(" AND title_folded = ?");
        bind_values.push(Value::Text(fold_title(title)));
    }

    for genre in &filter.genres {
        sql.push_str(
            " AND EXISTS (
                SELECT 1
                FROM json_each(books.genres)
                WHERE json_each.value = ?
            )",
        );
        bind_values.push(Value::Text(genre.clone()));
    }

    (sql, bind_values)
}

fn fold_title(title: &str) -> String {
    title.to_lowercase()
}

fn encode_genres(genres: &[String]) -> Result<String, DbError> {
    serde_json::to_string(genres)
        .map_err(|err| DbError::CorruptRow(format!("cannot encode genres: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{filtered_sql, fold_title};
    use crate::model::filters::BookFilter;
    use rusqlite::types::Value;

    #[test]
    fn empty_filter_adds_no_bindings() {
        let (sql, binds) = filtered_sql("SELECT 1 FROM books", &BookFilter::default());
        assert_eq!(sql, "SELECT 1 FROM books WHERE 1 = 1");
        assert!(binds.is_empty());
    }

    #[test]
    fn title_binding_is_folded() {
        let filter = BookFilter {
            title: Some("DUNE".to_string()),
            genres: vec!["scifi".to_string(), "classic".to_string()],
        };
        let (sql, binds) = filtered_sql("SELECT 1 FROM books", &filter);
        assert!(sql.contains("title_folded = ?"));
        assert_eq!(sql.matches("json_each").count(), 2);
        assert_eq!(
            binds,
            vec![
                Value::Text("dune".to_string()),
                Value::Text("scifi".to_string()),
                Value::Text("classic".to_string()),
            ]
        );
    }

    #[test]
    fn folding_handles_non_ascii() {
        assert_eq!(fold_title("ÉCRITS"), "écrits");
    }
}
