use crate::config::SmtpConfig;
use crate::error::{CropOpsError, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends plain-text reports through an authenticated SMTP relay
pub struct Mailer {
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        if config.to.is_empty() {
            return Err(CropOpsError::Config("smtp.to lists no recipients".into()));
        }
        Ok(Self { config })
    }

    pub fn recipients(&self) -> &[String] {
        &self.config.to
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        let from: Mailbox = self.config.from.parse()?;
        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for recipient in &self.config.to {
            builder = builder.to(recipient.parse()?);
        }

        Ok(builder.body(body.to_string())?)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?
        };

        Ok(builder
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }

    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(subject, body)?;
        self.transport()?.send(message).await?;
        tracing::info!(
            recipients = self.config.to.len(),
            host = %self.config.host,
            "Report mailed"
        );
        Ok(())
    }

    /// Open and authenticate an SMTP session without sending anything
    pub async fn test_connection(&self) -> Result<bool> {
        Ok(self.transport()?.test_connection().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(to: Vec<&str>) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "grower@example.com".into(),
            password: "secret".into(),
            from: "CropOps <grower@example.com>".into(),
            to: to.into_iter().map(String::from).collect(),
            starttls: true,
        }
    }

    #[test]
    fn requires_a_recipient() {
        assert!(Mailer::new(config(vec![])).is_err());
    }

    #[test]
    fn message_carries_all_recipients() {
        let mailer = Mailer::new(config(vec!["a@example.com", "b@example.com"])).unwrap();
        let message = mailer
            .build_message("[cropops] Grape 2026-01-15: forecast unavailable", "body")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn invalid_address_is_a_mail_error() {
        let mailer = Mailer::new(config(vec!["not an address"])).unwrap();
        assert!(matches!(
            mailer.build_message("s", "b"),
            Err(CropOpsError::Mail(_))
        ));
    }
}
