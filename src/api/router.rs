use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_book, create_loan, delete_book, get_book, get_loan, list_books, list_loans,
    list_loans_for_book, return_loan, update_book,
};

/// Creates the API router with the catalog and lending endpoints
///
/// Catalog:
/// - POST /api/books, GET /api/books
/// - GET/PUT/DELETE /api/books/:id
/// - GET /api/books/:id/loans
///
/// Lending:
/// - POST /api/loans, GET /api/loans
/// - GET/PUT /api/loans/:id
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Catalog
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/api/books/:id/loans", get(list_loans_for_book))
        // Lending
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/:id", put(return_loan).get(get_loan))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
