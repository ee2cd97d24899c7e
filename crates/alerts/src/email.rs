//! Alert email delivery via SMTP.
//!
//! [`EmailNotifier`] wraps the `lettre` async SMTP transport. The session is
//! EHLO, STARTTLS, login with the sender address and password, one message,
//! QUIT. There is a single attempt; the caller decides what a failure means.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use owtenter_core::alert::compose_body;
use owtenter_core::config::MailConfig;
use owtenter_core::thresholds::Violation;

/// Bound on the whole SMTP session.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailNotifier
// ---------------------------------------------------------------------------

pub struct EmailNotifier {
    config: MailConfig,
    temperature_unit: String,
}

impl EmailNotifier {
    pub fn new(config: MailConfig, temperature_unit: impl Into<String>) -> Self {
        Self {
            config,
            temperature_unit: temperature_unit.into(),
        }
    }

    /// Assemble the alert email for `violations`.
    pub fn build_message(&self, violations: &[Violation]) -> Result<Message, EmailError> {
        let from: Mailbox = self.config.from_address.parse()?;
        let to: Mailbox = self.config.recipient.parse()?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(self.config.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(compose_body(violations, &self.temperature_unit))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    /// Send one email covering all `violations`.
    pub async fn send(&self, violations: &[Violation]) -> Result<(), EmailError> {
        let email = self.build_message(violations)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.from_address.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        mailer.send(email).await?;

        tracing::info!(
            to = %self.config.recipient,
            violations = violations.len(),
            "Alert email sent",
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
