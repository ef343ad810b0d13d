use bookshelf_core::db::open_db;
use bookshelf_core::{BookDraft, BookRepository, Pages, SqliteBookRepository, StoreError};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

const WRITERS: usize = 8;

#[test]
fn racing_updates_on_one_row_apply_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");

    let original = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteBookRepository::try_new(&conn).unwrap();
        repo.insert_book(&BookDraft::new("Dune", 1965, 412, ["scifi"]))
            .unwrap()
    };

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            let mut edit = original.clone();
            edit.pages = Pages(500 + writer as i32);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let repo = SqliteBookRepository::try_new(&conn).unwrap();
                barrier.wait();
                repo.update_book(&edit).map(|version| (writer, version))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one writer must win: {results:?}");
    assert_eq!(winners[0].1, 2);

    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err, StoreError::EditConflict { version: 1, .. }),
                "losers must conflict, got {err}"
            );
        }
    }

    let stored = read_back(&path, original.id);
    assert_eq!(stored.version, 2);
    assert_eq!(stored.pages, Pages(500 + winners[0].0 as i32));
}

#[test]
fn sequential_writers_from_separate_connections_chain_versions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.db");

    let id = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteBookRepository::try_new(&conn).unwrap();
        repo.insert_book(&BookDraft::new("Dune", 1965, 412, ["scifi"]))
            .unwrap()
            .id
    };

    for expected_version in 2..=5 {
        let conn = open_db(&path).unwrap();
        let repo = SqliteBookRepository::try_new(&conn).unwrap();
        let mut book = repo.get_book(id).unwrap();
        book.pages = Pages(book.pages.0 + 1);
        assert_eq!(repo.update_book(&book).unwrap(), expected_version);
    }

    assert_eq!(read_back(&path, id).pages, Pages(416));
}

fn read_back(path: &Path, id: i64) -> bookshelf_core::Book {
    let conn = open_db(path).unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    repo.get_book(id).unwrap()
}
