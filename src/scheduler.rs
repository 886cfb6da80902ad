//! 延滞通知の定期実行
//!
//! 次のUTC深夜0時から一定間隔で延滞通知バッチを実行する。送信失敗は
//! ログに記録して次の周期を待つ（リトライは行わない）。

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use tokio::signal;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::application::loan::{LendingDependencies, OverdueNotice, notify_overdue_loans};
use crate::ports::NotificationService;

/// 延滞通知ループを実行する
///
/// 初回は次のUTC深夜0時に実行し、以降`interval_secs`ごとに実行する。
/// 再起動しても同じ日に通知が重複しない。Ctrl+C（SIGINT）を受け取るまで続く。
pub async fn run_overdue_notifications(
    deps: LendingDependencies,
    notifier: Arc<dyn NotificationService>,
    notice: OverdueNotice,
    interval_secs: u64,
) {
    let now = Utc::now().naive_utc();
    let delay = until_next_midnight(now);
    let first_run = now + delay;

    let mut interval = time::interval_at(
        Instant::now() + delay.to_std().unwrap_or_default(),
        Duration::from_secs(interval_secs.max(1)),
    );
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        interval_secs,
        threshold_days = notice.threshold_days,
        first_run = %first_run,
        "overdue notification scheduler started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_once(&deps, notifier.as_ref(), &notice).await;
            }

            _ = signal::ctrl_c() => {
                tracing::info!("shutdown signal received, stopping overdue notifications");
                break;
            }
        }
    }

    tracing::info!("overdue notification scheduler stopped");
}

/// `now`から次の深夜0時までの時間
///
/// ちょうど0時なら翌日の0時までの24時間を返す。
pub fn until_next_midnight(now: NaiveDateTime) -> ChronoDuration {
    let next_midnight = (now.date() + ChronoDuration::days(1))
        .and_hms_opt(0, 0, 0)
        .unwrap_or(now);
    next_midnight - now
}

/// 延滞通知を1回実行する
///
/// 失敗してもパニックせず、ログに記録して`None`を返す。
pub async fn run_once(
    deps: &LendingDependencies,
    notifier: &dyn NotificationService,
    notice: &OverdueNotice,
) -> Option<usize> {
    match notify_overdue_loans(deps, notifier, notice).await {
        Ok(notified) => Some(notified),
        Err(err) => {
            tracing::error!(error = %err, "overdue notification run failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBookStore, InMemoryLoanStore};
    use crate::adapters::mock::NotificationService as MockNotificationService;
    use crate::application::catalog::{CatalogDependencies, create_book};
    use crate::application::loan::create_loan;
    use crate::domain::commands::{CreateBook, CreateLoan};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    async fn setup_with_overdue_loan() -> LendingDependencies {
        let books = Arc::new(InMemoryBookStore::new());
        let loans = Arc::new(InMemoryLoanStore::new(books.clone()));
        let catalog = CatalogDependencies {
            book_store: books.clone(),
        };
        let deps = LendingDependencies {
            book_store: books,
            loan_store: loans,
        };

        create_book(
            &catalog,
            CreateBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: "978-0441013593".to_string(),
            },
        )
        .await
        .unwrap();

        create_loan(
            &deps,
            CreateLoan {
                isbn: "978-0441013593".to_string(),
                customer: "Alice".to_string(),
                customer_email: Some("alice@example.com".to_string()),
                loan_date: Utc::now().date_naive() - ChronoDuration::days(10),
            },
        )
        .await
        .unwrap();

        deps
    }

    #[tokio::test]
    async fn run_once_sends_notice_for_overdue_loans() {
        let deps = setup_with_overdue_loan().await;
        let notifier = MockNotificationService::new();

        let notified = run_once(&deps, &notifier, &OverdueNotice::default()).await;

        assert_eq!(notified, Some(1));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["alice@example.com".to_string()]);
    }

    #[tokio::test]
    async fn run_once_swallows_dispatch_failure() {
        let deps = setup_with_overdue_loan().await;
        let notifier = MockNotificationService::failing("smtp unavailable");

        let notified = run_once(&deps, &notifier, &OverdueNotice::default()).await;

        assert_eq!(notified, None);
    }

    #[tokio::test]
    async fn two_runs_notify_again() {
        let deps = setup_with_overdue_loan().await;
        let notifier = MockNotificationService::new();

        run_once(&deps, &notifier, &OverdueNotice::default()).await;
        run_once(&deps, &notifier, &OverdueNotice::default()).await;

        assert_eq!(notifier.sent().len(), 2);
    }

    #[test]
    fn first_run_waits_until_midnight() {
        assert_eq!(until_next_midnight(at(23, 0, 0)), ChronoDuration::hours(1));
        assert_eq!(
            until_next_midnight(at(12, 30, 15)),
            ChronoDuration::hours(11) + ChronoDuration::minutes(29) + ChronoDuration::seconds(45)
        );
    }

    #[test]
    fn exactly_midnight_waits_a_full_day() {
        assert_eq!(until_next_midnight(at(0, 0, 0)), ChronoDuration::days(1));
    }

    #[test]
    fn first_run_crosses_month_end() {
        let last_day = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();

        let delay = until_next_midnight(last_day);

        assert_eq!(delay, ChronoDuration::hours(6));
        assert_eq!(
            last_day + delay,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }
}
