use crate::domain::{
    book::Book,
    query::{BookFilter, Page, PageRequest},
    value_objects::{BookId, Isbn},
};
use crate::ports::StoreError;
use crate::ports::book_store::{BookStore as BookStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{limit_offset, map_sqlx_error, to_total};

/// PostgreSQLの行データをBookに変換する
///
/// ISBNが空の行は不正データとしてエラーにする。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let isbn: String = row.get("isbn");
    let isbn = Isbn::parse(&isbn).map_err(|e| {
        StoreError::backend(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    Ok(Book {
        book_id: BookId::from_uuid(row.get("book_id")),
        title: row.get("title"),
        author: row.get("author"),
        isbn,
    })
}

/// BookStoreのPostgreSQL実装
///
/// ISBNの一意性は`books_isbn_unique`制約で保証する。
pub struct BookStore {
    pool: PgPool,
}

impl BookStore {
    /// PostgreSQLコネクションプールから新しいBookStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStoreTrait for BookStore {
    async fn exists_by_isbn(&self, isbn: &Isbn) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_isbn(&self, isbn: &Isbn) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, author, isbn
            FROM books
            WHERE isbn = $1
            "#,
        )
        .bind(isbn.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, author, isbn
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 書籍を挿入する
    ///
    /// ISBN重複は一意制約違反として`UniqueViolation`になる。
    async fn save(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (book_id, title, author, isbn)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    /// タイトル・著者のみ更新する（ISBNは対象外）
    async fn update(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, updated_at = NOW()
            WHERE book_id = $1
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// 条件検索（大文字小文字を区別しない部分一致、ID昇順）
    ///
    /// 未指定の条件はNULLとしてバインドし、述語から除外する。
    /// LIKEのワイルドカードを解釈させないためstrposで判定する。
    async fn find(&self, filter: &BookFilter, page: PageRequest) -> Result<Page<Book>> {
        let (limit, offset) = limit_offset(page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM books
            WHERE ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0)
              AND ($2::text IS NULL OR strpos(lower(author), lower($2)) > 0)
            "#,
        )
        .bind(filter.title.as_deref())
        .bind(filter.author.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let rows = sqlx::query(
            r#"
            SELECT book_id, title, author, isbn
            FROM books
            WHERE ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0)
              AND ($2::text IS NULL OR strpos(lower(author), lower($2)) > 0)
            ORDER BY book_id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.title.as_deref())
        .bind(filter.author.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let items = rows.iter().map(map_row_to_book).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, to_total(total), page))
    }
}
