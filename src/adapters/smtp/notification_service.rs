//! SMTP delivery for overdue notifications

use crate::config::SmtpConfig;
use crate::ports::notification_service::{NotificationService as NotificationServiceTrait, Result};
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::str::FromStr;

/// NotificationService backed by an SMTP relay
///
/// One batch becomes one message: the sender is also the visible `To`
/// and every customer is a `Bcc` recipient, so customers never see each other.
#[derive(Clone)]
pub struct NotificationService {
    config: SmtpConfig,
}

impl NotificationService {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the batch message, or `None` when no recipient address is usable
    ///
    /// Invalid recipient addresses are skipped so one bad address does not
    /// hold back the notice for every other customer.
    fn build_message(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<Option<Message>> {
        let from = Mailbox::from_str(&self.config.from)
            .map_err(|e| format!("Invalid from address: {}", e))?;

        let mut builder = Message::builder()
            .from(from.clone())
            .to(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        let mut accepted = 0;
        for recipient in recipients {
            match Mailbox::from_str(recipient) {
                Ok(mailbox) => {
                    builder = builder.bcc(mailbox);
                    accepted += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        recipient = %recipient,
                        error = %e,
                        "skipping invalid recipient address"
                    );
                }
            }
        }

        if accepted == 0 {
            return Ok(None);
        }

        let message = builder
            .body(body.to_string())
            .map_err(|e| format!("Failed to build email: {}", e))?;
        Ok(Some(message))
    }

    fn build_transport(&self) -> Result<SmtpTransport> {
        let builder = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.host)
                .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.host)
        }
        .port(self.config.port);

        let builder = match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    async fn send_batch(&self, subject: &str, message: &str, recipients: &[String]) -> Result<()> {
        let Some(email) = self.build_message(subject, message, recipients)? else {
            tracing::warn!(
                recipients = recipients.len(),
                "no valid recipient address, overdue mail not sent"
            );
            return Ok(());
        };
        let mailer = self.build_transport()?;

        // lettreのSmtpTransportはブロッキングなのでランタイム外で送信する
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| format!("SMTP send task failed: {}", e))?
            .map_err(|e| format!("Failed to send email: {}", e))?;

        tracing::info!(recipients = recipients.len(), "overdue mail sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
            use_tls: false,
            from: "Library <library@example.com>".to_string(),
        }
    }

    #[test]
    fn test_build_message_puts_customers_in_bcc() {
        let service = NotificationService::new(config());
        let recipients = vec![
            "silva@example.com".to_string(),
            "costa@example.com".to_string(),
        ];

        let message = service
            .build_message("Book loan overdue", "Please return", &recipients)
            .unwrap()
            .unwrap();

        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 3);
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(!formatted.contains("silva@example.com"));
        assert!(formatted.contains("Subject: Book loan overdue"));
    }

    #[test]
    fn test_build_message_skips_invalid_recipient() {
        let service = NotificationService::new(config());
        let recipients = vec![
            "silva@example.com".to_string(),
            "not an address".to_string(),
            "costa@example.com".to_string(),
        ];

        let message = service
            .build_message("s", "m", &recipients)
            .unwrap()
            .unwrap();

        // 送信元 + 有効な顧客2件
        let to: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(|address| address.to_string())
            .collect();
        assert_eq!(to.len(), 3);
        assert!(to.contains(&"silva@example.com".to_string()));
        assert!(to.contains(&"costa@example.com".to_string()));
    }

    #[test]
    fn test_build_message_without_valid_recipient_is_none() {
        let service = NotificationService::new(config());

        let message = service
            .build_message("s", "m", &["not an address".to_string()])
            .unwrap();

        assert!(message.is_none());
    }

    #[tokio::test]
    async fn test_send_batch_without_valid_recipient_does_not_connect() {
        // 接続先のないホストでも、宛先が全て無効なら送信せずに成功する
        let service = NotificationService::new(SmtpConfig {
            host: "smtp.invalid".to_string(),
            ..config()
        });

        let result = service
            .send_batch("s", "m", &["@@".to_string(), "nobody".to_string()])
            .await;

        assert!(result.is_ok());
    }

    #[test]
    fn test_build_message_rejects_invalid_sender() {
        let service = NotificationService::new(SmtpConfig {
            from: "not an address".to_string(),
            ..config()
        });

        let result = service.build_message("s", "m", &["silva@example.com".to_string()]);

        assert!(result.is_err());
    }
}
