use crate::application::ApplicationError;
use crate::domain::ValidationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(ApplicationError);

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        ApiError(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError(ApplicationError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 404 Not Found - リクエストされたリソースが存在しない
            ApplicationError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),

            // 400 Bad Request - 入力不正
            ApplicationError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg)
            }

            // 409 Conflict - 一意制約違反
            ApplicationError::DuplicateIdentifier(msg) => {
                (StatusCode::CONFLICT, "DUPLICATE_IDENTIFIER", msg)
            }

            // 422 Unprocessable Entity - 参照先なし・ビジネスルール違反
            ApplicationError::ReferenceNotFound(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "REFERENCE_NOT_FOUND",
                msg,
            ),
            ApplicationError::BusinessRuleViolation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BUSINESS_RULE_VIOLATION",
                msg,
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApplicationError::Store(e) => {
                tracing::error!(error = ?e, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
            ApplicationError::Notification(e) => {
                tracing::error!(error = %e, "notification service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFICATION_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
