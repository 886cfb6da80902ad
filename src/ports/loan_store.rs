use crate::domain::{
    loan::Loan,
    query::{LoanFilter, Page, PageRequest},
    value_objects::{BookId, LoanId},
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub use super::error::Result;

/// 貸出ストアポート
///
/// 「1冊の書籍に対して貸出中（Open）の貸出は高々1件」という不変条件を
/// ストアレベルで保証する。
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// 書籍に貸出中の貸出が存在するか確認する
    async fn exists_open_loan_for_book(&self, book_id: BookId) -> Result<bool>;

    /// 新しい貸出を保存する
    ///
    /// 同じ書籍に貸出中の貸出が既にある場合は`StoreError::UniqueViolation`を返す。
    /// 確認と挿入は書籍単位で原子的に行われるため、同時に2件の貸出が
    /// 成立することはない。
    async fn save(&self, loan: &Loan) -> Result<()>;

    /// 既存の貸出を更新する（返却判断の記録）
    async fn update(&self, loan: &Loan) -> Result<()>;

    /// IDで貸出を取得する
    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 書籍のISBNまたは顧客名で貸出をID昇順でページ取得する
    ///
    /// 条件はOR。両方未指定の場合は全件が対象。
    async fn find_by_isbn_or_customer(
        &self,
        filter: &LoanFilter,
        page: PageRequest,
    ) -> Result<Page<Loan>>;

    /// 書籍に紐づく貸出をID昇順でページ取得する
    async fn find_by_book(&self, book_id: BookId, page: PageRequest) -> Result<Page<Loan>>;

    /// 延滞中の貸出を検索する
    ///
    /// `loan_date <= cutoff` かつ貸出中の貸出を返す。
    /// バッチ処理用のためページングしない。
    async fn find_overdue(&self, cutoff: NaiveDate) -> Result<Vec<Loan>>;
}
