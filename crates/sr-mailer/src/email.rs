//! SMTP delivery of batch summary emails via the `lettre` async transport.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sr_common::ProductEvent;
use sr_consumer::{DispatchResult, NotificationDispatcher};
use tracing::info;

use crate::summary;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("email build error: {0}")]
    Build(String),
}

/// SMTP settings, loaded once at startup.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Load configuration from environment variables. Returns `None` when
    /// `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default |
    /// |-----------------|----------|---------|
    /// | `SMTP_HOST`     | yes      | -       |
    /// | `SMTP_PORT`     | no       | `587`   |
    /// | `SMTP_FROM`     | yes      | -       |
    /// | `SMTP_USER`     | no       | -       |
    /// | `SMTP_PASSWORD` | no       | -       |
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        let from_address = std::env::var("SMTP_FROM").ok()?;
        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address,
            username: std::env::var("SMTP_USER").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Sends one consolidated summary email per batch.
///
/// The recipient is the batch's first event; events for other recipients in
/// the same window end up in the same email (documented producer-side
/// constraint).
pub struct EmailNotifier {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    /// Build the SMTP transport once; the notifier is reused for every batch.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    async fn send(&self, events: &[ProductEvent]) -> Result<(), MailError> {
        let recipient = &events[0].notify_address;

        let message = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(recipient.parse()?)
            .subject(summary::subject(events))
            .header(ContentType::TEXT_PLAIN)
            .body(summary::body(events))
            .map_err(|err| MailError::Build(err.to_string()))?;

        self.transport.send(message).await?;

        info!(
            recipient = %recipient,
            event_count = events.len(),
            "summary email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for EmailNotifier {
    async fn dispatch(&self, events: &[ProductEvent]) -> DispatchResult {
        match self.send(events).await {
            Ok(()) => DispatchResult::Success,
            Err(err) => DispatchResult::Failure {
                error: err.to_string(),
            },
        }
    }
}
