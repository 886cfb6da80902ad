use crate::ports::notification_service::{NotificationService as NotificationServiceTrait, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A batch handed to the mock notification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentBatch {
    pub subject: String,
    pub message: String,
    pub recipients: Vec<String>,
}

/// Mock implementation of NotificationService
///
/// Does not send actual notifications. Every batch is logged. The recording mode keeps
/// batches in memory so tests can inspect what would have been sent; the log-only mode
/// keeps nothing and is what a long-running process with mail disabled uses.
/// Can be switched into a failing mode to exercise dispatch errors.
pub struct NotificationService {
    sent: Mutex<Vec<SentBatch>>,
    record: bool,
    failure: Option<String>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            record: true,
            failure: None,
        }
    }

    /// Create a notifier that only logs batches
    pub fn log_only() -> Self {
        Self {
            record: false,
            ..Self::new()
        }
    }

    /// Create a notifier whose every dispatch fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Batches recorded so far
    pub fn sent(&self) -> Vec<SentBatch> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    /// Log the batch instead of delivering it
    async fn send_batch(&self, subject: &str, message: &str, recipients: &[String]) -> Result<()> {
        if let Some(reason) = &self.failure {
            return Err(reason.clone().into());
        }

        if !self.record {
            tracing::info!(
                subject,
                recipients = recipients.len(),
                "mock notification batch logged"
            );
            return Ok(());
        }

        tracing::info!(
            subject,
            recipients = recipients.len(),
            "mock notification batch recorded"
        );

        self.sent
            .lock()
            .map_err(|_| "mock notification mutex poisoned")?
            .push(SentBatch {
                subject: subject.to_string(),
                message: message.to_string(),
                recipients: recipients.to_vec(),
            });
        Ok(())
    }
}
