use thiserror::Error;

/// ストア（永続化ポート）のエラー
///
/// 一意制約違反だけはアプリケーション層で業務エラーに変換するため区別する。
/// それ以外の障害は分類せずに`Backend`として伝播させる。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 一意制約違反（ISBN重複、同一書籍の貸出中レコード重複）
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// ストアの障害（接続エラーなど）
    #[error("store backend failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
