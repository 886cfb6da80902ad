pub mod book_store;
pub mod loan_store;

// パブリックに型を再エクスポート
pub use book_store::BookStore as PostgresBookStore;
pub use loan_store::LoanStore as PostgresLoanStore;

use crate::ports::StoreError;

/// sqlxのエラーをストアのエラーに変換する
///
/// 一意制約違反のみ区別し、それ以外は分類せずに包む。
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(
                db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string()),
            );
        }
    }
    StoreError::backend(err)
}

/// ページ指定をLIMIT/OFFSET用の値に変換する
fn limit_offset(page: crate::domain::query::PageRequest) -> (i64, i64) {
    (
        i64::from(page.page_size()),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

/// COUNT(*)の結果を件数に変換する
fn to_total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}
