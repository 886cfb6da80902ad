use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::loan::LoanDetails;
use crate::domain::{
    book::Book,
    commands::{CreateBook, CreateLoan, ReturnLoan, UpdateBook},
    query::{BookFilter, LoanFilter, Page, PageRequest},
    value_objects::{BookId, LoanId},
    ValidationError,
};

/// 書籍登録リクエスト（POST /api/books）
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl CreateBookRequest {
    pub fn to_command(&self) -> CreateBook {
        CreateBook {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
        }
    }
}

/// 書籍更新リクエスト（PUT /api/books/:id）
///
/// ISBNは受け付けない。
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: String,
    pub author: String,
}

impl UpdateBookRequest {
    pub fn to_command(&self, book_id: Uuid) -> UpdateBook {
        UpdateBook {
            book_id: BookId::from_uuid(book_id),
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

/// 貸出作成リクエスト（POST /api/loans）
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub isbn: String,
    pub customer: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    /// 省略時は本日
    #[serde(default)]
    pub loan_date: Option<NaiveDate>,
}

impl CreateLoanRequest {
    pub fn to_command(&self, today: NaiveDate) -> CreateLoan {
        CreateLoan {
            isbn: self.isbn.clone(),
            customer: self.customer.clone(),
            customer_email: self.customer_email.clone(),
            loan_date: self.loan_date.unwrap_or(today),
        }
    }
}

/// 返却リクエスト（PUT /api/loans/:id）
#[derive(Debug, Deserialize)]
pub struct ReturnLoanRequest {
    pub returned: bool,
}

impl ReturnLoanRequest {
    pub fn to_command(&self, loan_id: Uuid) -> ReturnLoan {
        ReturnLoan {
            loan_id: LoanId::from_uuid(loan_id),
            returned: self.returned,
        }
    }
}

/// ページ指定（未指定は先頭ページ・既定サイズ）
fn page_request(page: Option<u32>, size: Option<u32>) -> Result<PageRequest, ValidationError> {
    let defaults = PageRequest::default();
    PageRequest::new(
        page.unwrap_or(defaults.page_index()),
        size.unwrap_or(defaults.page_size()),
    )
}

/// ページ指定のみのクエリパラメータ（GET /api/books/:id/loans）
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn to_page_request(&self) -> Result<PageRequest, ValidationError> {
        page_request(self.page, self.size)
    }
}

/// 書籍一覧のクエリパラメータ（GET /api/books）
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListBooksQuery {
    pub fn to_filter(&self) -> BookFilter {
        BookFilter::new(self.title.clone(), self.author.clone())
    }

    pub fn to_page_request(&self) -> Result<PageRequest, ValidationError> {
        page_request(self.page, self.size)
    }
}

/// 貸出一覧のクエリパラメータ（GET /api/loans）
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub isbn: Option<String>,
    pub customer: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListLoansQuery {
    pub fn to_filter(&self) -> LoanFilter {
        LoanFilter::new(self.isbn.clone(), self.customer.clone())
    }

    pub fn to_page_request(&self) -> Result<PageRequest, ValidationError> {
        page_request(self.page, self.size)
    }
}

/// 書籍レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.book_id.value(),
            title: book.title,
            author: book.author,
            isbn: book.isbn.as_str().to_string(),
        }
    }
}

/// 貸出レスポンス
///
/// `book`は書籍が削除済みの場合`null`になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
    pub status: String,
    pub book: Option<BookResponse>,
}

impl From<LoanDetails> for LoanResponse {
    fn from(details: LoanDetails) -> Self {
        let LoanDetails { loan, book } = details;
        Self {
            id: loan.loan_id.value(),
            book_id: loan.book_id.value(),
            customer: loan.customer,
            customer_email: loan.customer_email,
            loan_date: loan.loan_date,
            returned: loan.returned,
            status: loan.status.as_str().to_string(),
            book: book.map(BookResponse::from),
        }
    }
}

/// 貸出作成レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCreatedResponse {
    pub id: Uuid,
}

/// ページ単位の一覧レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page: u32,
    pub size: u32,
}

impl<T, U: Into<T>> From<Page<U>> for PageResponse<T> {
    fn from(page: Page<U>) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            total_elements: page.total_elements,
            total_pages,
            page: page.page_index,
            size: page.page_size,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}
