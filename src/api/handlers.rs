use crate::application::{
    catalog::{self, CatalogDependencies},
    loan::{self, LendingDependencies},
};
use crate::domain::value_objects::{BookId, LoanId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        BookResponse, CreateBookRequest, CreateLoanRequest, ListBooksQuery, ListLoansQuery,
        LoanCreatedResponse, LoanResponse, PageQuery, PageResponse, ReturnLoanRequest,
        UpdateBookRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogDependencies,
    pub lending: LendingDependencies,
}

// ============================================================================
// Catalog handlers
// ============================================================================

/// POST /api/books - 書籍を登録
///
/// ISBNが登録済みの場合は409。
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = catalog::create_book(&state.catalog, req.to_command()).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /api/books - 書籍一覧（タイトル・著者の部分一致、ページング）
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<PageResponse<BookResponse>>, ApiError> {
    let page = query.to_page_request()?;
    let books = catalog::find_books(&state.catalog, &query.to_filter(), page).await?;
    Ok(Json(PageResponse::from(books)))
}

/// GET /api/books/:id - 書籍詳細
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = catalog::get_book(&state.catalog, BookId::from_uuid(book_id)).await?;
    Ok(Json(BookResponse::from(book)))
}

/// PUT /api/books/:id - タイトル・著者を更新
///
/// ISBNは変更できない。
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = catalog::update_book(&state.catalog, req.to_command(book_id)).await?;
    Ok(Json(BookResponse::from(book)))
}

/// DELETE /api/books/:id - 書籍を削除
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    catalog::delete_book(&state.catalog, BookId::from_uuid(book_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/books/:id/loans - 書籍の貸出履歴
pub async fn list_loans_for_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<LoanResponse>>, ApiError> {
    let page = query.to_page_request()?;
    let loans = loan::get_loans_for_book(&state.lending, BookId::from_uuid(book_id), page).await?;
    Ok(Json(PageResponse::from(loans)))
}

// ============================================================================
// Lending handlers
// ============================================================================

/// POST /api/loans - 書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - ISBNに対応する書籍が存在すること（なければ422）
/// - 書籍が貸出中でないこと（貸出中なら422）
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanCreatedResponse>), ApiError> {
    let today = chrono::Utc::now().date_naive();
    let loan_id = loan::create_loan(&state.lending, req.to_command(today)).await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanCreatedResponse {
            id: loan_id.value(),
        }),
    ))
}

/// PUT /api/loans/:id - 返却判断を記録して貸出を終了
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
    Json(req): Json<ReturnLoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let closed = loan::return_loan(&state.lending, req.to_command(loan_id)).await?;

    // 書籍情報を付加して返す
    let details = loan::get_loan(&state.lending, closed.loan_id).await?;
    Ok(Json(LoanResponse::from(details)))
}

/// GET /api/loans/:id - 貸出詳細
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let details = loan::get_loan(&state.lending, LoanId::from_uuid(loan_id)).await?;
    Ok(Json(LoanResponse::from(details)))
}

/// GET /api/loans - 貸出一覧
///
/// クエリパラメータ:
/// - isbn: 書籍のISBN（完全一致）
/// - customer: 顧客名（完全一致）
///
/// 両方指定した場合はどちらかに一致するものを返す。
/// どちらも指定しない場合は全件。
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<PageResponse<LoanResponse>>, ApiError> {
    let page = query.to_page_request()?;
    let loans = loan::find_loans(&state.lending, &query.to_filter(), page).await?;
    Ok(Json(PageResponse::from(loans)))
}
