//! SMTP transport for notifications

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::info;

use super::{Mailer, NotifyError};
use crate::config::SmtpSettings;

const SUBJECT: &str = "Flight Price Notification";

/// Timeout for each SMTP exchange
const SMTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends notifications through an authenticated STARTTLS relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&settings.user)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, body: &str, recipients: &[String]) -> Result<(), NotifyError> {
        let message = build_message(&self.from, body, recipients)?;
        self.transport.send(message).await?;
        info!(count = recipients.len(), "Email sent");
        Ok(())
    }
}

/// Builds a plain-text message addressed to every recipient
fn build_message(from: &Mailbox, body: &str, recipients: &[String]) -> Result<Message, NotifyError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN);
    for recipient in recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }
    Ok(builder.body(body.to_string())?)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse::<Mailbox>().map_err(|e| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_message_addresses_all_recipients() {
        let from = parse_mailbox("watcher@example.com").unwrap();
        let recipients = vec!["ada@example.com".to_string(), "bo@example.com".to_string()];

        let message = build_message(&from, "Deal found", &recipients).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Flight Price Notification"));
        assert!(raw.contains("ada@example.com"));
        assert!(raw.contains("bo@example.com"));
        assert!(raw.contains("Deal found"));
    }

    #[test]
    fn test_bad_recipient_is_an_address_error() {
        let from = parse_mailbox("watcher@example.com").unwrap();

        let result = build_message(&from, "body", &["not an address".to_string()]);

        assert!(matches!(result, Err(NotifyError::Address { .. })));
    }
}
