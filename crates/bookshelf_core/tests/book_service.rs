use bookshelf_core::db::open_db_in_memory;
use bookshelf_core::{
    BookDraft, BookFilter, BookListQuery, BookPatch, BookService, BookServiceError,
    PageMetadata, Pages, Pagination, SqliteBookRepository,
};

#[test]
fn dune_scenario_create_update_then_stale_update() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());

    let mut book = service
        .create_book(BookDraft::new("Dune", 1965, 412, ["scifi"]))
        .unwrap();
    assert_eq!(book.id, 1);
    assert_eq!(book.version, 1);

    let mut stale = book.clone();
    book.pages = Pages(420);
    service.update_book(&mut book).unwrap();
    assert_eq!(book.version, 2);

    stale.pages = Pages(420);
    let err = service.update_book(&mut stale).unwrap_err();
    assert!(matches!(
        err,
        BookServiceError::EditConflict { id: 1, version: 1 }
    ));
    assert_eq!(stale.version, 1);

    let stored = service.get_book(1).unwrap();
    assert_eq!(stored.pages, Pages(420));
    assert_eq!(stored.version, 2);
}

#[test]
fn invalid_update_is_rejected_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());

    let mut book = service
        .create_book(BookDraft::new("Dune", 1965, 412, ["scifi"]))
        .unwrap();
    book.genres = vec!["scifi".to_string(), "scifi".to_string()];

    match service.update_book(&mut book).unwrap_err() {
        BookServiceError::Validation(errors) => {
            assert_eq!(
                errors.messages_for("genres"),
                vec!["must not contain duplicate values"]
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(service.get_book(book.id).unwrap().version, 1);
}

#[test]
fn patch_applies_provided_fields_only() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());
    let created = service
        .create_book(BookDraft::new("Dune", 1965, 412, ["scifi"]))
        .unwrap();

    let patch = BookPatch {
        title: Some("Dune Messiah".to_string()),
        year: Some(1969),
        ..BookPatch::default()
    };
    let updated = service.patch_book(created.id, patch, None).unwrap();

    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(updated.year, 1969);
    assert_eq!(updated.pages, Pages(412));
    assert_eq!(updated.genres, vec!["scifi"]);
    assert_eq!(updated.version, 2);
    assert_eq!(service.get_book(created.id).unwrap(), updated);
}

#[test]
fn patch_with_mismatched_expected_version_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());
    let created = service
        .create_book(BookDraft::new("Dune", 1965, 412, ["scifi"]))
        .unwrap();

    let patch = BookPatch {
        pages: Some(Pages(420)),
        ..BookPatch::default()
    };
    service.patch_book(created.id, patch.clone(), Some(1)).unwrap();

    let err = service.patch_book(created.id, patch, Some(1)).unwrap_err();
    assert!(matches!(
        err,
        BookServiceError::EditConflict { version: 1, .. }
    ));
    assert_eq!(service.get_book(created.id).unwrap().version, 2);
}

#[test]
fn patch_of_missing_book_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());

    let err = service
        .patch_book(7, BookPatch::default(), None)
        .unwrap_err();
    assert!(matches!(err, BookServiceError::NotFound(7)));
}

#[test]
fn delete_then_get_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());
    let created = service
        .create_book(BookDraft::new("Dune", 1965, 412, ["scifi"]))
        .unwrap();

    service.delete_book(created.id).unwrap();
    assert!(matches!(
        service.get_book(created.id),
        Err(BookServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.delete_book(created.id),
        Err(BookServiceError::NotFound(_))
    ));
}

#[test]
fn paginated_list_reports_metadata() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());
    for index in 0..5 {
        service
            .create_book(BookDraft::new(
                format!("Volume {index}"),
                2000 + index,
                100,
                ["reference"],
            ))
            .unwrap();
    }

    let query = BookListQuery {
        filter: BookFilter {
            title: None,
            genres: vec!["reference".to_string()],
        },
        pagination: Some(Pagination::new(2, 2)),
    };
    let result = service.list_books(&query).unwrap();

    assert_eq!(
        result
            .items
            .iter()
            .map(|book| book.title.as_str())
            .collect::<Vec<_>>(),
        vec!["Volume 2", "Volume 3"]
    );
    assert_eq!(
        result.metadata,
        Some(PageMetadata {
            current_page: 2,
            page_size: 2,
            first_page: 1,
            last_page: 3,
            total_records: 5,
        })
    );
}

#[test]
fn unpaginated_list_has_no_metadata() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());

    let result = service.list_books(&BookListQuery::default()).unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.metadata, None);
}
