//! Outbound-mail collaborator.
//!
//! The delivery coordinator only ever sees the [`Mailer`] trait: one send
//! operation, one error value, no retry and no partial-success signal. The
//! SMTP wire protocol itself lives behind lettre's transport.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::submission::Submission;

/// Errors from building or sending an outbound message.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("{0}")]
    Other(String),
}

/// Single outbound-send operation consumed by the delivery coordinator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_message(&self, submission: &Submission) -> Result<(), MailError>;
}

/// SMTP-backed [`Mailer`] forwarding submissions to a fixed recipient.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl SmtpMailer {
    /// Build the transport from the destination parameters in the config.
    /// The parameters are taken as-is; nothing here validates them beyond
    /// the sender/recipient addresses parsing as mailboxes.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.hostname)?
            .port(config.port)
            .credentials(Credentials::new(
                config.email.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            sender: config.email.parse()?,
            recipient: config.to.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_message(&self, submission: &Submission) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .reply_to(submission.email.parse()?)
            .to(self.recipient.clone())
            .subject(submission.subject.as_str())
            .body(submission.body.clone())?;

        self.transport.send(message).await?;

        tracing::info!(
            fullname = %submission.fullname,
            email = %submission.email,
            "forwarded submission over smtp"
        );
        Ok(())
    }
}
