use thiserror::Error;

/// ドメインの入力検証エラー
///
/// アプリケーション層で`InvalidArgument`に変換される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必須項目が空
    #[error("{0} must not be blank")]
    Blank(&'static str),

    /// ページサイズが0
    #[error("page size must be greater than zero")]
    InvalidPageSize,

    /// 延滞判定の閾値が負数
    #[error("overdue threshold must not be negative (got {0})")]
    NegativeThreshold(i64),
}
