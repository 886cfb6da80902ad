use crate::domain::loan::OVERDUE_THRESHOLD_DAYS;
use crate::ports::NotificationService;

use super::loan_service::{LendingDependencies, get_overdue_loans};
use crate::application::errors::{ApplicationError, Result};

/// 延滞通知の件名（既定値）
pub const DEFAULT_SUBJECT: &str = "Book loan overdue";

/// 延滞通知の本文（既定値）
pub const DEFAULT_MESSAGE: &str =
    "You have a book loan that is overdue. Please return the book as soon as possible.";

/// 延滞通知の内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueNotice {
    pub subject: String,
    pub message: String,
    pub threshold_days: i64,
}

impl Default for OverdueNotice {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            threshold_days: OVERDUE_THRESHOLD_DAYS,
        }
    }
}

/// 延滞通知バッチ
///
/// 定期的に実行され、延滞中の貸出の顧客へ固定メッセージを一括送信する。
///
/// 処理フロー：
/// 1. 延滞中の貸出を取得
/// 2. 各貸出を顧客メールアドレスに射影（未登録は除外、重複は1件にまとめる）
/// 3. 通知サービスへ1回の呼び出しで送信（宛先が0件なら送信しない）
///
/// リトライは行わない。送信失敗は`ApplicationError::Notification`として返す。
///
/// # 戻り値
/// 通知した宛先の件数
pub async fn notify_overdue_loans(
    deps: &LendingDependencies,
    notifier: &dyn NotificationService,
    notice: &OverdueNotice,
) -> Result<usize> {
    let overdue = get_overdue_loans(deps, notice.threshold_days).await?;

    let mut recipients: Vec<String> = Vec::with_capacity(overdue.len());
    let mut without_email = 0usize;
    for loan in &overdue {
        match &loan.customer_email {
            Some(email) if !recipients.contains(email) => recipients.push(email.clone()),
            Some(_) => {}
            None => without_email += 1,
        }
    }

    if without_email > 0 {
        tracing::warn!(
            count = without_email,
            "overdue loans without customer email were skipped"
        );
    }

    if recipients.is_empty() {
        tracing::info!(overdue = overdue.len(), "no overdue customers to notify");
        return Ok(0);
    }

    notifier
        .send_batch(&notice.subject, &notice.message, &recipients)
        .await
        .map_err(ApplicationError::Notification)?;

    tracing::info!(
        overdue = overdue.len(),
        recipients = recipients.len(),
        "overdue notifications dispatched"
    );
    Ok(recipients.len())
}
