use crate::domain::{
    book::Book,
    query::{BookFilter, Page, PageRequest},
    value_objects::{BookId, Isbn},
};
use async_trait::async_trait;

pub use super::error::Result;

/// カタログストアポート
///
/// 書籍IDから書誌情報への永続的な対応を管理する。
/// ISBNの一意性はこのストアが保証する。
#[async_trait]
pub trait BookStore: Send + Sync {
    /// 指定したISBNの書籍が存在するか確認する
    async fn exists_by_isbn(&self, isbn: &Isbn) -> Result<bool>;

    /// ISBNで書籍を取得する
    async fn find_by_isbn(&self, isbn: &Isbn) -> Result<Option<Book>>;

    /// IDで書籍を取得する
    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 新しい書籍を保存する
    ///
    /// 同じISBNの書籍が既に存在する場合は`StoreError::UniqueViolation`を返す。
    /// 存在確認と挿入は原子的に行われる。
    async fn save(&self, book: &Book) -> Result<()>;

    /// 既存の書籍のタイトル・著者を更新する
    ///
    /// ISBNは更新しない。
    async fn update(&self, book: &Book) -> Result<()>;

    /// 書籍を削除する
    ///
    /// 削除した場合は`true`、該当がなければ`false`を返す。
    async fn delete(&self, book_id: BookId) -> Result<bool>;

    /// 条件に一致する書籍をID昇順でページ取得する
    async fn find(&self, filter: &BookFilter, page: PageRequest) -> Result<Page<Book>>;
}
