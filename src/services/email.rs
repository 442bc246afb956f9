use super::notification::{NotificationChannel, Notice, Recipient};
use crate::config::email::EmailConfig;
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
}

impl EmailService {
    /// Build from environment variables. If SMTP is not configured, email
    /// sending is silently skipped (graceful degradation).
    pub fn from_env() -> Self {
        let Some(cfg) = EmailConfig::from_env() else {
            return Self::unconfigured();
        };

        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build());

        match transport {
            Ok(t) => Self {
                transport: Some(t),
                from_address: Some(cfg.from_address),
            },
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport: {e}");
                Self::unconfigured()
            }
        }
    }

    fn unconfigured() -> Self {
        Self {
            transport: None,
            from_address: None,
        }
    }

    /// Returns true if SMTP is configured and available.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let (Some(transport), Some(from_address)) = (&self.transport, &self.from_address) else {
            tracing::debug!("SMTP not configured, skipping email");
            return Ok(());
        };

        let from_mailbox: Mailbox =
            from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", from_address, e)
                })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for EmailService {
    fn name(&self) -> &'static str {
        "email"
    }

    fn accepts(&self, recipient: &Recipient) -> bool {
        self.is_configured() && recipient.email.is_some()
    }

    async fn deliver(&self, recipient: &Recipient, notice: &Notice) -> Result<()> {
        let Some(to) = &recipient.email else {
            return Ok(());
        };
        self.send_email(to, &notice.subject, &notice.body).await?;
        tracing::info!(user_id = recipient.user_id, subject = %notice.subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_service_accepts_nobody() {
        let service = EmailService::unconfigured();
        let recipient = Recipient {
            user_id: 1,
            name: "Ravi".into(),
            email: Some("ravi@campus.edu".into()),
            phone: None,
        };
        assert!(!service.is_configured());
        assert!(!service.accepts(&recipient));
    }

    #[tokio::test]
    async fn unconfigured_send_is_skipped() {
        let service = EmailService::unconfigured();
        assert!(service
            .send_email("ravi@campus.edu", "subject", "body")
            .await
            .is_ok());
    }
}
