// SMTP delivery via Stalwart's mail-send
use crate::error::{EmailError, EmailResult};
use crate::notifier::Notifier;
use async_trait::async_trait;
use logger_redacted::redact;
use mail_builder::MessageBuilder;
use mail_send::SmtpClientBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

/// SMTP server settings
#[derive(Clone, Deserialize, Serialize)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

/// Email service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub smtp: SmtpSettings,
    pub from_email: String,
    pub from_name: String,
    pub email_enabled: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp: SmtpSettings {
                host: "localhost".to_string(),
                port: 587,
                username: None,
                password: None,
                use_tls: true,
            },
            from_email: "noreply@eventhub.local".to_string(),
            from_name: "EventHub".to_string(),
            email_enabled: true,
        }
    }
}

impl EmailConfig {
    /// Load email configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EmailConfig::from_env`] with values supplied by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            smtp: SmtpSettings {
                host: lookup("SMTP_HOST").unwrap_or(defaults.smtp.host),
                port: lookup("SMTP_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.smtp.port),
                username: lookup("SMTP_USERNAME"),
                password: lookup("SMTP_PASSWORD"),
                use_tls: lookup("SMTP_TLS_ENABLED")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.smtp.use_tls),
            },
            from_email: lookup("EMAIL_FROM").unwrap_or(defaults.from_email),
            from_name: lookup("EMAIL_FROM_NAME").unwrap_or(defaults.from_name),
            email_enabled: lookup("EMAIL_ENABLED")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.email_enabled),
        }
    }
}

/// Email service for sending transactional emails via Stalwart
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        if !config.email_enabled {
            info!("Email service disabled by configuration");
        }
        Self { config }
    }

    /// Send an HTML email
    pub async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> EmailResult<String> {
        if !to.contains('@') {
            return Err(EmailError::InvalidRecipient(redact(to)));
        }

        if !self.config.email_enabled {
            debug!(to = %redact(to), "Email disabled, skipping send");
            return Ok(format!("disabled-{}", Uuid::new_v4()));
        }

        let message = MessageBuilder::new()
            .from((
                self.config.from_name.as_str(),
                self.config.from_email.as_str(),
            ))
            .to(to)
            .subject(subject)
            .html_body(html_body);

        self.send_message(message).await
    }

    async fn send_message(&self, message: MessageBuilder<'_>) -> EmailResult<String> {
        let smtp = &self.config.smtp;
        let mut smtp_client =
            SmtpClientBuilder::new(smtp.host.as_str(), smtp.port).implicit_tls(smtp.use_tls);

        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            smtp_client = smtp_client.credentials((user.as_str(), pass.as_str()));
        }

        let mut client = smtp_client
            .connect()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SMTP connection failed: {e}")))?;

        let message_id = Uuid::new_v4().to_string();
        client
            .send(message)
            .await
            .map_err(|e| EmailError::SendFailed(format!("Failed to send email: {e}")))?;

        debug!(provider = "smtp", message_id = %message_id, "Email sent successfully");
        Ok(message_id)
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> EmailResult<String> {
        self.send_html_email(to, subject, html_body).await
    }
}
