use crate::domain::{
    book::Book,
    query::{BookFilter, Page, PageRequest},
    value_objects::{BookId, Isbn},
};
use crate::ports::book_store::{BookStore as BookStoreTrait, Result};
use crate::ports::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::lock;

/// BookStoreのインメモリ実装
///
/// ID順に並ぶBTreeMapで保持する。ISBNの重複確認と挿入は
/// 同じロックの中で行うため原子的。
pub struct BookStore {
    books: Mutex<BTreeMap<BookId, Book>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(BTreeMap::new()),
        }
    }

    /// 書籍IDからISBNを引く（貸出ストアの検索で使用）
    pub(crate) fn isbn_of(&self, book_id: BookId) -> Result<Option<Isbn>> {
        Ok(lock(&self.books)?.get(&book_id).map(|b| b.isbn.clone()))
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStoreTrait for BookStore {
    async fn exists_by_isbn(&self, isbn: &Isbn) -> Result<bool> {
        Ok(lock(&self.books)?.values().any(|b| &b.isbn == isbn))
    }

    async fn find_by_isbn(&self, isbn: &Isbn) -> Result<Option<Book>> {
        Ok(lock(&self.books)?
            .values()
            .find(|b| &b.isbn == isbn)
            .cloned())
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(lock(&self.books)?.get(&book_id).cloned())
    }

    async fn save(&self, book: &Book) -> Result<()> {
        let mut books = lock(&self.books)?;
        if books.values().any(|b| b.isbn == book.isbn) {
            return Err(StoreError::UniqueViolation(format!("isbn {}", book.isbn)));
        }
        books.insert(book.book_id, book.clone());
        Ok(())
    }

    async fn update(&self, book: &Book) -> Result<()> {
        let mut books = lock(&self.books)?;
        if let Some(existing) = books.get_mut(&book.book_id) {
            existing.title = book.title.clone();
            existing.author = book.author.clone();
        }
        Ok(())
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        Ok(lock(&self.books)?.remove(&book_id).is_some())
    }

    async fn find(&self, filter: &BookFilter, page: PageRequest) -> Result<Page<Book>> {
        let matching: Vec<Book> = lock(&self.books)?
            .values()
            .filter(|b| filter.matches(&b.title, &b.author))
            .cloned()
            .collect();
        Ok(Page::slice(matching, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::register_book;

    fn book(title: &str, author: &str, isbn: &str) -> Book {
        register_book(title, author, Isbn::parse(isbn).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_isbn() {
        let store = BookStore::new();
        store.save(&book("T", "A", "123")).await.unwrap();

        let result = store.save(&book("Other", "B", "123")).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));

        let page = store
            .find(&BookFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn test_update_never_touches_isbn() {
        let store = BookStore::new();
        let original = book("T", "A", "123");
        store.save(&original).await.unwrap();

        let mut changed = original.clone();
        changed.title = "New".to_string();
        changed.isbn = Isbn::parse("999").unwrap();
        store.update(&changed).await.unwrap();

        let stored = store.find_by_id(original.book_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "New");
        assert_eq!(stored.isbn.as_str(), "123");
    }

    #[tokio::test]
    async fn test_find_orders_by_id() {
        let store = BookStore::new();
        let first = book("Rust in Action", "McNamara", "1");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = book("Programming Rust", "Blandy", "2");
        store.save(&second).await.unwrap();
        store.save(&first).await.unwrap();

        let page = store
            .find(
                &BookFilter::new(Some("rust".to_string()), None),
                PageRequest::default(),
            )
            .await
            .unwrap();
        let ids: Vec<BookId> = page.items.iter().map(|b| b.book_id).collect();
        assert_eq!(ids, vec![first.book_id, second.book_id]);
    }

    #[tokio::test]
    async fn test_delete_reports_missing() {
        let store = BookStore::new();
        assert!(!store.delete(BookId::new()).await.unwrap());
    }
}
