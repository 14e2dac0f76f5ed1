//! Subscriber notifications
//!
//! `Composer` turns run outcomes into plain-text messages; `Notifier` hands
//! them to a `Mailer`. An empty recipient list never reaches the transport.

mod compose;
mod smtp;

pub use compose::{Composer, FailureSource};
pub use smtp::SmtpMailer;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when sending a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A sender or recipient address could not be parsed
    #[error("Invalid email address {address:?}: {reason}")]
    Address { address: String, reason: String },

    /// The message could not be assembled
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    /// The mail server rejected the message or could not be reached
    #[error("Failed to send email: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Delivers a message body to a list of recipients
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, body: &str, recipients: &[String]) -> Result<(), NotifyError>;
}

/// Mailer that writes messages to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, body: &str, recipients: &[String]) -> Result<(), NotifyError> {
        info!(recipients = %recipients.join(", "), "Dry run, email not sent:\n{}", body);
        Ok(())
    }
}

/// Dispatches composed messages through a `Mailer`
#[derive(Debug, Clone)]
pub struct Notifier<M> {
    mailer: M,
}

impl<M: Mailer> Notifier<M> {
    pub fn new(mailer: M) -> Self {
        Self { mailer }
    }

    /// Sends `body` to `recipients`; an empty list is a successful no-op
    pub async fn dispatch(&self, body: &str, recipients: &[String]) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            debug!("No recipients, skipping email");
            return Ok(());
        }
        self.mailer.send(body, recipients).await
    }
}
