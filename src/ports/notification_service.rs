use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知サービスポート
///
/// 顧客への通知配信メカニズムを抽象化する。
/// 失敗の内容はコアにとって不透明であり、そのまま呼び出し元に返される。
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 同一メッセージを複数の宛先へ一括送信する
    ///
    /// 延滞通知バッチから1回の呼び出しで使用される。
    async fn send_batch(&self, subject: &str, message: &str, recipients: &[String]) -> Result<()>;
}
