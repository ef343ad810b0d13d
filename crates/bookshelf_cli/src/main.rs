//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `bookshelf_core` linkage and database bootstrap from a shell.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `bookshelf_cli [DB_PATH]`. Without a path an in-memory database is
//! used.

use bookshelf_core::db::open_db_with_config;
use bookshelf_core::{BookFilter, BookRepository, SqliteBookRepository, StoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("bookshelf_core ping={}", bookshelf_core::ping());
    println!("bookshelf_core version={}", bookshelf_core::core_version());

    let config = match std::env::args_os().nth(1) {
        Some(path) => StoreConfig::with_path(path),
        None => StoreConfig::default(),
    };

    match count_books(&config) {
        Ok(total) => {
            println!("bookshelf_core books={total}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("bookshelf_core error={err}");
            ExitCode::FAILURE
        }
    }
}

fn count_books(config: &StoreConfig) -> Result<u64, Box<dyn std::error::Error>> {
    let conn = open_db_with_config(config)?;
    let repo = SqliteBookRepository::try_new(&conn)?.with_timeout(config.operation_timeout());
    Ok(repo.count_books(&BookFilter::default())?)
}
