mod catalog_service;

pub use catalog_service::{
    CatalogDependencies, create_book, delete_book, find_books, get_book, get_book_by_isbn,
    update_book,
};
