//! Outgoing email.
//!
//! [`Mailer`] is the transport seam. [`SmtpMailer`] delivers through an SMTP
//! relay, [`LogMailer`] only logs (used when email is disabled) and
//! [`RecordingMailer`] keeps messages in memory for tests.

use std::collections::HashSet;

use async_trait::async_trait;
use clubdesk_common::{AppError, AppResult, config::EmailConfig};
use futures::future::join_all;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tokio::sync::Mutex;

/// A rendered email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    /// Recipient display name
    pub to_name: String,
    pub subject: String,
    /// Plain text body
    pub body: String,
}

/// Email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message.
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Outcome of a batch send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send every message concurrently and wait for all of them.
///
/// Failures never propagate: each one is logged at debug level and the batch
/// emits a single warning when at least one send failed.
pub async fn send_batch(mailer: &dyn Mailer, messages: &[EmailMessage]) -> BatchReport {
    let results = join_all(messages.iter().map(|m| mailer.send(m))).await;

    let mut report = BatchReport::default();
    for (message, result) in messages.iter().zip(results) {
        match result {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                tracing::debug!(to = %message.to, error = %e, "Email send failed");
            }
        }
    }

    if report.failed > 0 {
        tracing::warn!(
            sent = report.sent,
            failed = report.failed,
            "Some notification emails could not be sent"
        );
    }

    report
}

/// SMTP transport built from [`EmailConfig`].
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the SMTP transport. No connection is opened until the first send.
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let builder = builder.port(config.smtp_port);
        let builder = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        let address: Address = config
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(config.from_name.clone()), address),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let to: Address = message
            .to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient {}: {e}", message.to)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(Some(message.to_name.clone()), to))
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| AppError::Email(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        tracing::debug!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email delivery disabled, not sending"
        );
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: HashSet<String>,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer that rejects messages to these addresses.
    #[must_use]
    pub fn failing_for<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// Messages accepted so far.
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if self.failing.contains(&message.to) {
            return Err(AppError::Email(format!("Rejected recipient {}", message.to)));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            to_name: "Someone".to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_batch_all_succeed() {
        let mailer = RecordingMailer::new();
        let messages = vec![message("a@example.com"), message("b@example.com")];

        let report = send_batch(&mailer, &messages).await;

        assert_eq!(report, BatchReport { sent: 2, failed: 0 });
        assert_eq!(mailer.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn test_send_batch_failures_do_not_stop_others() {
        let mailer = RecordingMailer::failing_for(["b@example.com"]);
        let messages = vec![
            message("a@example.com"),
            message("b@example.com"),
            message("c@example.com"),
        ];

        let report = send_batch(&mailer, &messages).await;

        assert_eq!(report, BatchReport { sent: 2, failed: 1 });
        let sent: Vec<String> = mailer.sent().await.into_iter().map(|m| m.to).collect();
        assert!(sent.contains(&"a@example.com".to_string()));
        assert!(sent.contains(&"c@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_send_batch_empty() {
        let report = send_batch(&LogMailer, &[]).await;
        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_from_address() {
        let config = EmailConfig {
            enabled: true,
            smtp_host: "localhost".to_string(),
            smtp_tls: false,
            from_address: "not an address".to_string(),
            ..EmailConfig::default()
        };

        assert!(matches!(SmtpMailer::new(&config), Err(AppError::Config(_))));
    }
}
