use std::env;

/// SMTP settings for the email notification channel.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EmailConfig {
    /// `None` unless host, username and password are all set; email
    /// notifications are then skipped.
    pub fn from_env() -> Option<Self> {
        let smtp_host = non_empty_var("SMTP_HOST")?;
        let smtp_username = non_empty_var("SMTP_USERNAME")?;
        let smtp_password = non_empty_var("SMTP_PASSWORD")?;
        let smtp_port = non_empty_var("SMTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);
        let from_address = non_empty_var("SMTP_FROM")
            .unwrap_or_else(|| format!("Campus Issues <{smtp_username}>"));

        Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_address,
        })
    }
}
