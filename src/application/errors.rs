use thiserror::Error;

use crate::domain::ValidationError;
use crate::ports::StoreError;

/// アプリケーション層のエラー
///
/// 同じ失敗条件は常に同じ種別で返される。
/// 呼び出し元（API層など）が種別ごとに応答へ変換する。
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 指定されたIDのエンティティが存在しない
    #[error("{0}")]
    NotFound(String),

    /// 参照先のエンティティが存在しない（例: ISBNに対応する書籍がない）
    #[error("{0}")]
    ReferenceNotFound(String),

    /// 一意制約違反（例: ISBN重複）
    #[error("{0}")]
    DuplicateIdentifier(String),

    /// ビジネスルール違反（例: 貸出中の書籍を貸し出そうとした）
    #[error("{0}")]
    BusinessRuleViolation(String),

    /// 不正な入力
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// ストアのエラー（分類しない）
    #[error("store error")]
    Store(#[source] StoreError),

    /// 通知サービスのエラー（分類しない）
    #[error("notification service error")]
    Notification(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<ValidationError> for ApplicationError {
    fn from(err: ValidationError) -> Self {
        ApplicationError::InvalidArgument(err.to_string())
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, ApplicationError>;
