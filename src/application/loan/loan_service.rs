use crate::domain::{
    self,
    book::Book,
    commands::{CreateLoan, ReturnLoan},
    loan::Loan,
    query::{LoanFilter, Page, PageRequest},
    value_objects::{BookId, Isbn, LoanId},
};
use crate::ports::{BookStore, LoanStore, StoreError};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::errors::{ApplicationError, Result};

/// 貸出中の書籍を貸し出そうとした場合のメッセージ
pub const BOOK_ALREADY_ON_LOAN: &str = "book already on loan";

/// ISBNに対応する書籍がない場合のメッセージ
pub const BOOK_NOT_FOUND_FOR_ISBN: &str = "book not found for supplied isbn";

/// 貸出サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct LendingDependencies {
    pub book_store: Arc<dyn BookStore>,
    pub loan_store: Arc<dyn LoanStore>,
}

/// 表示用に書籍情報を付加した貸出
///
/// 書籍が削除済みの場合、`book`は`None`になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanDetails {
    pub loan: Loan,
    pub book: Option<Book>,
}

fn loan_not_found(loan_id: LoanId) -> ApplicationError {
    ApplicationError::NotFound(format!("loan {} not found", loan_id))
}

/// 貸出に現在の書籍情報を付加するヘルパー関数
///
/// 同一ページ内で同じ書籍を何度も取得しないようにキャッシュする。
async fn attach_books(deps: &LendingDependencies, page: Page<Loan>) -> Result<Page<LoanDetails>> {
    let mut books: HashMap<BookId, Option<Book>> = HashMap::new();
    let mut items = Vec::with_capacity(page.items.len());

    for loan in page.items {
        let book = match books.get(&loan.book_id) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = deps
                    .book_store
                    .find_by_id(loan.book_id)
                    .await
                    .map_err(ApplicationError::Store)?;
                books.insert(loan.book_id, fetched.clone());
                fetched
            }
        };
        items.push(LoanDetails { loan, book });
    }

    Ok(Page {
        items,
        total_elements: page.total_elements,
        page_index: page.page_index,
        page_size: page.page_size,
    })
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - ISBNに対応する書籍が存在すること（なければReferenceNotFound）
/// - 書籍に貸出中の貸出がないこと（あればBusinessRuleViolation）
///
/// # 一貫性保証
///
/// 事前確認に加え、LoanStoreが書籍単位で「確認と挿入」を原子的に行う。
/// 同じ書籍への同時リクエストのうち成功するのは1件だけで、
/// 残りは事前確認と同じBusinessRuleViolationになる。
///
/// # 戻り値
/// 成功時は作成された貸出のID
pub async fn create_loan(deps: &LendingDependencies, cmd: CreateLoan) -> Result<LoanId> {
    // 1. ISBNから書籍を解決
    let isbn = Isbn::parse(&cmd.isbn)?;
    let book = deps
        .book_store
        .find_by_isbn(&isbn)
        .await
        .map_err(ApplicationError::Store)?
        .ok_or_else(|| {
            tracing::warn!(isbn = %isbn, "rejected loan: unknown isbn");
            ApplicationError::ReferenceNotFound(BOOK_NOT_FOUND_FOR_ISBN.to_string())
        })?;

    // 2. 貸出中の確認
    let on_loan = deps
        .loan_store
        .exists_open_loan_for_book(book.book_id)
        .await
        .map_err(ApplicationError::Store)?;

    if on_loan {
        tracing::warn!(book_id = %book.book_id, "rejected loan: book already on loan");
        return Err(ApplicationError::BusinessRuleViolation(
            BOOK_ALREADY_ON_LOAN.to_string(),
        ));
    }

    // 3. ドメイン層の純粋関数を呼び出し
    let loan = domain::loan::lend_book(
        book.book_id,
        &cmd.customer,
        cmd.customer_email.as_deref(),
        cmd.loan_date,
    )?;

    // 4. 保存（ストアの一意制約で競合を検出）
    deps.loan_store.save(&loan).await.map_err(|e| match e {
        StoreError::UniqueViolation(_) => {
            tracing::warn!(book_id = %book.book_id, "rejected loan: concurrent loan won the race");
            ApplicationError::BusinessRuleViolation(BOOK_ALREADY_ON_LOAN.to_string())
        }
        other => ApplicationError::Store(other),
    })?;

    tracing::info!(
        loan_id = %loan.loan_id,
        book_id = %book.book_id,
        customer = %loan.customer,
        "book loaned"
    );
    Ok(loan.loan_id)
}

/// 返却判断を記録する
///
/// 既に返却済みの貸出に対しても受け付ける（冪等）。
pub async fn return_loan(deps: &LendingDependencies, cmd: ReturnLoan) -> Result<Loan> {
    let loan = deps
        .loan_store
        .find_by_id(cmd.loan_id)
        .await
        .map_err(ApplicationError::Store)?
        .ok_or_else(|| loan_not_found(cmd.loan_id))?;

    let closed = domain::loan::return_loan(&loan, cmd.returned);

    deps.loan_store
        .update(&closed)
        .await
        .map_err(ApplicationError::Store)?;

    tracing::info!(loan_id = %closed.loan_id, returned = cmd.returned, "loan closed");
    Ok(closed)
}

/// IDで貸出を取得する（書籍情報付き）
pub async fn get_loan(deps: &LendingDependencies, loan_id: LoanId) -> Result<LoanDetails> {
    let loan = deps
        .loan_store
        .find_by_id(loan_id)
        .await
        .map_err(ApplicationError::Store)?
        .ok_or_else(|| loan_not_found(loan_id))?;

    let book = deps
        .book_store
        .find_by_id(loan.book_id)
        .await
        .map_err(ApplicationError::Store)?;

    Ok(LoanDetails { loan, book })
}

/// ISBNまたは顧客名で貸出を検索する
///
/// 条件はOR（両方未指定なら全件）。ID昇順。
pub async fn find_loans(
    deps: &LendingDependencies,
    filter: &LoanFilter,
    page: PageRequest,
) -> Result<Page<LoanDetails>> {
    let loans = deps
        .loan_store
        .find_by_isbn_or_customer(filter, page)
        .await
        .map_err(ApplicationError::Store)?;

    attach_books(deps, loans).await
}

/// 書籍に紐づく貸出の一覧を取得する
///
/// 書籍が存在しない場合はNotFound。
pub async fn get_loans_for_book(
    deps: &LendingDependencies,
    book_id: BookId,
    page: PageRequest,
) -> Result<Page<LoanDetails>> {
    let book = deps
        .book_store
        .find_by_id(book_id)
        .await
        .map_err(ApplicationError::Store)?
        .ok_or_else(|| ApplicationError::NotFound(format!("book {} not found", book_id)))?;

    let loans = deps
        .loan_store
        .find_by_book(book_id, page)
        .await
        .map_err(ApplicationError::Store)?;

    Ok(loans.map(|loan| LoanDetails {
        loan,
        book: Some(book.clone()),
    }))
}

/// 延滞中の貸出をすべて取得する（本日基準）
///
/// `loan_date <= 今日 - threshold_days` かつ貸出中の貸出。
pub async fn get_overdue_loans(deps: &LendingDependencies, threshold_days: i64) -> Result<Vec<Loan>> {
    let today = chrono::Utc::now().date_naive();
    get_overdue_loans_as_of(deps, today, threshold_days).await
}

/// 延滞中の貸出をすべて取得する（基準日指定）
pub async fn get_overdue_loans_as_of(
    deps: &LendingDependencies,
    today: NaiveDate,
    threshold_days: i64,
) -> Result<Vec<Loan>> {
    let cutoff = domain::loan::overdue_cutoff(today, threshold_days)?;

    let loans = deps
        .loan_store
        .find_overdue(cutoff)
        .await
        .map_err(ApplicationError::Store)?;

    Ok(loans
        .into_iter()
        .filter(|loan| domain::loan::is_overdue(loan, cutoff))
        .collect())
}
