use super::notification::{NotificationChannel, Notice, Recipient};
use crate::config::sms::SmsConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Thin client for an HTTP SMS gateway: one JSON POST per message.
#[derive(Clone)]
pub struct SmsService {
    client: reqwest::Client,
    gateway_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SmsPayload<'a> {
    to: &'a str,
    message: &'a str,
}

impl SmsService {
    /// `Ok(None)` when no gateway is configured.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(cfg) = SmsConfig::from_env() else {
            return Ok(None);
        };
        Self::new(cfg).map(Some)
    }

    pub fn new(cfg: SmsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("Failed to build SMS HTTP client")?;
        Ok(Self {
            client,
            gateway_url: cfg.gateway_url,
            api_token: cfg.api_token,
        })
    }

    pub async fn send_sms(&self, to: &str, message: &str) -> Result<()> {
        let mut request = self
            .client
            .post(&self.gateway_url)
            .json(&SmsPayload { to, message });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .context("SMS gateway unreachable")?
            .error_for_status()
            .context("SMS gateway rejected message")?;
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for SmsService {
    fn name(&self) -> &'static str {
        "sms"
    }

    fn accepts(&self, recipient: &Recipient) -> bool {
        recipient.phone.is_some()
    }

    async fn deliver(&self, recipient: &Recipient, notice: &Notice) -> Result<()> {
        let Some(to) = &recipient.phone else {
            return Ok(());
        };
        self.send_sms(to, &notice.body).await?;
        tracing::info!(user_id = recipient.user_id, "SMS sent");
        Ok(())
    }
}
