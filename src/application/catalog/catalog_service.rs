use crate::domain::{
    self,
    book::Book,
    commands::{CreateBook, UpdateBook},
    query::{BookFilter, Page, PageRequest},
    value_objects::{BookId, Isbn},
};
use crate::ports::{BookStore, StoreError};
use std::sync::Arc;

use crate::application::errors::{ApplicationError, Result};

/// カタログサービスの依存関係
///
/// 振る舞いは持たず、各関数に明示的に渡される。
#[derive(Clone)]
pub struct CatalogDependencies {
    pub book_store: Arc<dyn BookStore>,
}

fn book_not_found(book_id: BookId) -> ApplicationError {
    ApplicationError::NotFound(format!("book {} not found", book_id))
}

fn duplicate_isbn(isbn: &Isbn) -> ApplicationError {
    ApplicationError::DuplicateIdentifier(format!("isbn {} is already registered", isbn))
}

/// 書籍を登録する
///
/// ビジネスルール：
/// - タイトル・著者・ISBNは空不可
/// - ISBNはカタログ内で一意
///
/// 存在確認の後にストアへ保存する。確認と保存の間に同じISBNが
/// 登録された場合もストアの一意制約で検出し、同じエラー種別を返す。
pub async fn create_book(deps: &CatalogDependencies, cmd: CreateBook) -> Result<Book> {
    let isbn = Isbn::parse(&cmd.isbn)?;
    let book = domain::book::register_book(&cmd.title, &cmd.author, isbn)?;

    let exists = deps
        .book_store
        .exists_by_isbn(&book.isbn)
        .await
        .map_err(ApplicationError::Store)?;

    if exists {
        tracing::warn!(isbn = %book.isbn, "rejected book registration: duplicate isbn");
        return Err(duplicate_isbn(&book.isbn));
    }

    deps.book_store.save(&book).await.map_err(|e| match e {
        StoreError::UniqueViolation(_) => duplicate_isbn(&book.isbn),
        other => ApplicationError::Store(other),
    })?;

    tracing::info!(book_id = %book.book_id, isbn = %book.isbn, "book registered");
    Ok(book)
}

/// IDで書籍を取得する
pub async fn get_book(deps: &CatalogDependencies, book_id: BookId) -> Result<Book> {
    deps.book_store
        .find_by_id(book_id)
        .await
        .map_err(ApplicationError::Store)?
        .ok_or_else(|| book_not_found(book_id))
}

/// 書籍のタイトル・著者を更新する
///
/// ISBNは変更されない（コマンドにISBNが含まれない）。
pub async fn update_book(deps: &CatalogDependencies, cmd: UpdateBook) -> Result<Book> {
    let current = get_book(deps, cmd.book_id).await?;
    let updated = domain::book::update_details(&current, &cmd.title, &cmd.author)?;

    deps.book_store
        .update(&updated)
        .await
        .map_err(ApplicationError::Store)?;

    tracing::info!(book_id = %updated.book_id, "book updated");
    Ok(updated)
}

/// 書籍を削除する
///
/// 貸出中の貸出が残っていても削除は拒否しない。
/// 貸出履歴は保持され、参照先のない貸出として扱われる。
pub async fn delete_book(deps: &CatalogDependencies, book_id: BookId) -> Result<()> {
    let deleted = deps
        .book_store
        .delete(book_id)
        .await
        .map_err(ApplicationError::Store)?;

    if !deleted {
        return Err(book_not_found(book_id));
    }

    tracing::info!(book_id = %book_id, "book deleted");
    Ok(())
}

/// 条件に一致する書籍をID昇順でページ取得する
pub async fn find_books(
    deps: &CatalogDependencies,
    filter: &BookFilter,
    page: PageRequest,
) -> Result<Page<Book>> {
    deps.book_store
        .find(filter, page)
        .await
        .map_err(ApplicationError::Store)
}

/// ISBNで書籍を取得する
///
/// 該当がない場合はエラーではなく`None`を返す。
pub async fn get_book_by_isbn(deps: &CatalogDependencies, isbn: &str) -> Result<Option<Book>> {
    let isbn = Isbn::parse(isbn)?;
    deps.book_store
        .find_by_isbn(&isbn)
        .await
        .map_err(ApplicationError::Store)
}
