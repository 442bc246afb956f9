use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub gateway_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl SmsConfig {
    /// Returns None when no gateway is configured; SMS delivery is then skipped.
    pub fn from_env() -> Option<Self> {
        let gateway_url = env::var("SMS_GATEWAY_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())?;
        let api_token = env::var("SMS_GATEWAY_TOKEN").ok().filter(|t| !t.is_empty());
        let timeout = env::var("SMS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Some(Self {
            gateway_url,
            api_token,
            timeout,
        })
    }
}
