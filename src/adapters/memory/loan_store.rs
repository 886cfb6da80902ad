use crate::domain::{
    loan::Loan,
    query::{LoanFilter, Page, PageRequest},
    value_objects::{BookId, LoanId},
};
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use crate::ports::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{book_store::BookStore, lock};

/// LoanStoreのインメモリ実装
///
/// 「貸出中の貸出が既にないか」の確認と挿入は同じロックの中で行う。
/// ISBN検索のために同じプロセス内のBookStoreを参照する（SQLのJOIN相当）。
pub struct LoanStore {
    loans: Mutex<BTreeMap<LoanId, Loan>>,
    books: Arc<BookStore>,
}

impl LoanStore {
    pub fn new(books: Arc<BookStore>) -> Self {
        Self {
            loans: Mutex::new(BTreeMap::new()),
            books,
        }
    }
}

fn conflicting_open_loan(loans: &BTreeMap<LoanId, Loan>, loan: &Loan) -> bool {
    loan.is_open()
        && loans
            .values()
            .any(|l| l.book_id == loan.book_id && l.is_open() && l.loan_id != loan.loan_id)
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn exists_open_loan_for_book(&self, book_id: BookId) -> Result<bool> {
        Ok(lock(&self.loans)?
            .values()
            .any(|l| l.book_id == book_id && l.is_open()))
    }

    async fn save(&self, loan: &Loan) -> Result<()> {
        let mut loans = lock(&self.loans)?;
        if conflicting_open_loan(&loans, loan) {
            return Err(StoreError::UniqueViolation(format!(
                "open loan for book {}",
                loan.book_id
            )));
        }
        loans.insert(loan.loan_id, loan.clone());
        Ok(())
    }

    async fn update(&self, loan: &Loan) -> Result<()> {
        let mut loans = lock(&self.loans)?;
        if conflicting_open_loan(&loans, loan) {
            return Err(StoreError::UniqueViolation(format!(
                "open loan for book {}",
                loan.book_id
            )));
        }
        if let Some(existing) = loans.get_mut(&loan.loan_id) {
            existing.returned = loan.returned;
            existing.status = loan.status;
        }
        Ok(())
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(lock(&self.loans)?.get(&loan_id).cloned())
    }

    async fn find_by_isbn_or_customer(
        &self,
        filter: &LoanFilter,
        page: PageRequest,
    ) -> Result<Page<Loan>> {
        let snapshot: Vec<Loan> = lock(&self.loans)?.values().cloned().collect();

        let mut matching = Vec::new();
        for loan in snapshot {
            let matched = match self.books.isbn_of(loan.book_id)? {
                _ if filter.is_unfiltered() => true,
                Some(isbn) => filter.matches(isbn.as_str(), &loan.customer),
                // 書籍が削除済みの場合は顧客名のみで判定する
                None => filter.customer.as_deref() == Some(loan.customer.as_str()),
            };
            if matched {
                matching.push(loan);
            }
        }

        Ok(Page::slice(matching, page))
    }

    async fn find_by_book(&self, book_id: BookId, page: PageRequest) -> Result<Page<Loan>> {
        let matching: Vec<Loan> = lock(&self.loans)?
            .values()
            .filter(|l| l.book_id == book_id)
            .cloned()
            .collect();
        Ok(Page::slice(matching, page))
    }

    async fn find_overdue(&self, cutoff: NaiveDate) -> Result<Vec<Loan>> {
        Ok(lock(&self.loans)?
            .values()
            .filter(|l| l.is_open() && l.loan_date <= cutoff)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::register_book;
    use crate::domain::loan::{lend_book, return_loan};
    use crate::domain::value_objects::Isbn;
    use crate::ports::BookStore as _;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    async fn setup() -> (Arc<BookStore>, LoanStore, BookId) {
        let books = Arc::new(BookStore::new());
        let book = register_book("T", "A", Isbn::parse("123").unwrap()).unwrap();
        books.save(&book).await.unwrap();
        let loans = LoanStore::new(books.clone());
        (books, loans, book.book_id)
    }

    #[tokio::test]
    async fn test_save_rejects_second_open_loan() {
        let (_, store, book_id) = setup().await;
        let first = lend_book(book_id, "Silva", None, today()).unwrap();
        let second = lend_book(book_id, "Costa", None, today()).unwrap();

        store.save(&first).await.unwrap();
        let result = store.save(&second).await;

        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));
        assert!(store.find_by_id(second.loan_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_allows_new_loan_after_close() {
        let (_, store, book_id) = setup().await;
        let first = lend_book(book_id, "Silva", None, today()).unwrap();
        store.save(&first).await.unwrap();
        store.update(&return_loan(&first, true)).await.unwrap();

        let second = lend_book(book_id, "Costa", None, today()).unwrap();
        store.save(&second).await.unwrap();
        assert!(store.exists_open_loan_for_book(book_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_isbn_or_customer_keeps_orphaned_loans_searchable_by_customer() {
        let (books, store, book_id) = setup().await;
        let loan = lend_book(book_id, "Silva", None, today()).unwrap();
        store.save(&loan).await.unwrap();
        books.delete(book_id).await.unwrap();

        let by_isbn = store
            .find_by_isbn_or_customer(
                &LoanFilter::new(Some("123".to_string()), None),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_isbn.total_elements, 0);

        let by_customer = store
            .find_by_isbn_or_customer(
                &LoanFilter::new(None, Some("Silva".to_string())),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_customer.total_elements, 1);
    }

    #[tokio::test]
    async fn test_find_overdue_excludes_closed_loans() {
        let (_, store, book_id) = setup().await;
        let old = lend_book(book_id, "Silva", None, today() - chrono::Duration::days(10)).unwrap();
        store.save(&old).await.unwrap();
        store.update(&return_loan(&old, false)).await.unwrap();

        let overdue = store.find_overdue(today()).await.unwrap();
        assert!(overdue.is_empty());
    }
}
