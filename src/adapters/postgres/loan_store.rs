use crate::domain::{
    loan::{Loan, LoanStatus},
    query::{LoanFilter, Page, PageRequest},
    value_objects::{BookId, LoanId},
};
use crate::ports::StoreError;
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::{limit_offset, map_sqlx_error, to_total};

/// PostgreSQLの行データをLoanに変換する
///
/// statusの文字列からの変換でエラーハンドリングを行う。
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(|e| {
        StoreError::backend(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        customer: row.get("customer"),
        customer_email: row.get("customer_email"),
        loan_date: row.get("loan_date"),
        returned: row.get("returned"),
        status,
    })
}

/// LoanStoreのPostgreSQL実装
///
/// 「1冊につき貸出中は1件まで」は部分一意インデックス
/// `loans_one_open_per_book`（status = 'open'）で保証する。
/// 同時に挿入された場合も一方のINSERTが一意制約違反で失敗する。
pub struct LoanStore {
    pool: PgPool,
}

impl LoanStore {
    /// PostgreSQLコネクションプールから新しいLoanStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn exists_open_loan_for_book(&self, book_id: BookId) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = $1 AND status = 'open')",
        )
        .bind(book_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn save(&self, loan: &Loan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                book_id,
                customer,
                customer_email,
                loan_date,
                returned,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.book_id.value())
        .bind(&loan.customer)
        .bind(loan.customer_email.as_deref())
        .bind(loan.loan_date)
        .bind(loan.returned)
        .bind(loan.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    /// 返却判断とステータスのみ更新する
    async fn update(&self, loan: &Loan) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE loans
            SET returned = $2, status = $3, updated_at = NOW()
            WHERE loan_id = $1
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.returned)
        .bind(loan.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer,
                customer_email,
                loan_date,
                returned,
                status
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// ISBN一致 OR 顧客名一致（両方NULLなら全件）
    ///
    /// 書籍が削除された貸出も顧客名では検索できるようLEFT JOINする。
    async fn find_by_isbn_or_customer(
        &self,
        filter: &LoanFilter,
        page: PageRequest,
    ) -> Result<Page<Loan>> {
        let (limit, offset) = limit_offset(page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans l
            LEFT JOIN books b ON b.book_id = l.book_id
            WHERE ($1::text IS NULL AND $2::text IS NULL)
               OR b.isbn = $1
               OR l.customer = $2
            "#,
        )
        .bind(filter.isbn.as_deref())
        .bind(filter.customer.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let rows = sqlx::query(
            r#"
            SELECT
                l.loan_id,
                l.book_id,
                l.customer,
                l.customer_email,
                l.loan_date,
                l.returned,
                l.status
            FROM loans l
            LEFT JOIN books b ON b.book_id = l.book_id
            WHERE ($1::text IS NULL AND $2::text IS NULL)
               OR b.isbn = $1
               OR l.customer = $2
            ORDER BY l.loan_id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.isbn.as_deref())
        .bind(filter.customer.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let items = rows.iter().map(map_row_to_loan).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, to_total(total), page))
    }

    async fn find_by_book(&self, book_id: BookId, page: PageRequest) -> Result<Page<Loan>> {
        let (limit, offset) = limit_offset(page);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer,
                customer_email,
                loan_date,
                returned,
                status
            FROM loans
            WHERE book_id = $1
            ORDER BY loan_id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(book_id.value())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let items = rows.iter().map(map_row_to_loan).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, to_total(total), page))
    }

    /// 延滞候補を検索（バッチ延滞通知用）
    ///
    /// (loan_date) WHERE status = 'open' の部分インデックスを使用する。
    async fn find_overdue(&self, cutoff: NaiveDate) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer,
                customer_email,
                loan_date,
                returned,
                status
            FROM loans
            WHERE status = 'open' AND loan_date <= $1
            ORDER BY loan_id ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(map_row_to_loan).collect()
    }
}
