use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::application::loan::{DEFAULT_MESSAGE, DEFAULT_SUBJECT, OverdueNotice};
use crate::domain::loan::OVERDUE_THRESHOLD_DAYS;

/// 延滞通知バッチの既定間隔（1日）
pub const DEFAULT_OVERDUE_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// 設定読み込みのエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// SMTP接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    /// 送信元（`Name <address>`形式も可）
    pub from: String,
}

/// 延滞通知バッチの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueConfig {
    pub threshold_days: i64,
    pub check_interval_secs: u64,
    pub subject: String,
    pub message: String,
}

/// アプリケーション設定
///
/// 環境変数から読み込む。未設定の項目は既定値を使う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_enabled: bool,
    pub smtp: SmtpConfig,
    pub overdue: OverdueConfig,
}

impl Config {
    /// プロセスの環境変数から読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー参照関数から読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: text("DATABASE_URL", "postgres://localhost/library"),
            port: parse(&lookup, "PORT", 3000)?,
            mail_enabled: parse_bool(&lookup, "MAIL_ENABLED", true)?,
            smtp: SmtpConfig {
                host: text("SMTP_HOST", "localhost"),
                port: parse(&lookup, "SMTP_PORT", 587)?,
                username: lookup("SMTP_USERNAME").filter(|v| !v.is_empty()),
                password: lookup("SMTP_PASSWORD").filter(|v| !v.is_empty()),
                use_tls: parse_bool(&lookup, "SMTP_USE_TLS", true)?,
                from: text("MAIL_FROM", "library@localhost"),
            },
            overdue: OverdueConfig {
                threshold_days: parse(&lookup, "OVERDUE_THRESHOLD_DAYS", OVERDUE_THRESHOLD_DAYS)?,
                check_interval_secs: parse(
                    &lookup,
                    "OVERDUE_CHECK_INTERVAL_SECS",
                    DEFAULT_OVERDUE_CHECK_INTERVAL_SECS,
                )?,
                subject: text("MAIL_SUBJECT", DEFAULT_SUBJECT),
                message: text("MAIL_LATE_LOANS_MESSAGE", DEFAULT_MESSAGE),
            },
        })
    }

    pub fn overdue_notice(&self) -> OverdueNotice {
        OverdueNotice {
            subject: self.overdue.subject.clone(),
            message: self.overdue.message.clone(),
            threshold_days: self.overdue.threshold_days,
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.port, 3000);
        assert!(config.mail_enabled);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.overdue.threshold_days, 4);
        assert_eq!(config.overdue.check_interval_secs, 86_400);
        assert_eq!(config.overdue_notice(), OverdueNotice::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("MAIL_ENABLED", "false"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", ""),
            ("OVERDUE_THRESHOLD_DAYS", "7"),
            ("MAIL_LATE_LOANS_MESSAGE", "Please return your book"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(!config.mail_enabled);
        assert_eq!(config.smtp.username.as_deref(), Some("mailer"));
        assert_eq!(config.smtp.password, None);
        assert_eq!(config.overdue.threshold_days, 7);
        assert_eq!(config.overdue_notice().message, "Please return your book");
    }

    #[test]
    fn test_invalid_number() {
        let result = Config::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_bool() {
        let result = Config::from_lookup(lookup_from(&[("SMTP_USE_TLS", "maybe")]));
        assert!(result.is_err());
    }
}
