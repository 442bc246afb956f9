use crate::models::UserModel;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};

/// Contact details of someone to notify, resolved from the user table at the
/// moment of the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<UserModel> for Recipient {
    fn from(user: UserModel) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            email: user.email.filter(|e| !e.trim().is_empty()),
            phone: user.phone.filter(|p| !p.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub subject: String,
    pub body: String,
}

impl Notice {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// One delivery mechanism (email, SMS, ...).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this channel can reach the recipient at all.
    fn accepts(&self, recipient: &Recipient) -> bool;

    async fn deliver(&self, recipient: &Recipient, notice: &Notice) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Best-effort fan-out of a notice over every configured channel.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    channels: Arc<Vec<Arc<dyn NotificationChannel>>>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Email and SMS channels from the environment; unconfigured ones are left out.
    pub fn from_env() -> Self {
        let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

        let email = super::email::EmailService::from_env();
        if email.is_configured() {
            tracing::info!("SMTP email channel configured");
            channels.push(Arc::new(email));
        } else {
            tracing::warn!("SMTP not configured, email notifications will be skipped");
        }

        match super::sms::SmsService::from_env() {
            Ok(Some(sms)) => {
                tracing::info!("SMS gateway channel configured");
                channels.push(Arc::new(sms));
            }
            Ok(None) => tracing::warn!("SMS gateway not configured, SMS will be skipped"),
            Err(e) => tracing::warn!("Failed to build SMS gateway client: {e}"),
        }

        Self::new(channels)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Spawn the fan-out and return immediately.
    ///
    /// Each (recipient, channel) pair runs as its own task in a `JoinSet`, so
    /// one slow or failing delivery never holds up the others. Recipients are
    /// de-duplicated by user id. Callers that don't care about the outcome
    /// simply drop the handle.
    pub fn dispatch(&self, recipients: Vec<Recipient>, notice: Notice) -> JoinHandle<DispatchSummary> {
        let channels = Arc::clone(&self.channels);

        tokio::spawn(async move {
            let notice = Arc::new(notice);
            let mut seen = HashSet::new();
            let mut set = JoinSet::new();

            for recipient in recipients {
                if !seen.insert(recipient.user_id) {
                    continue;
                }
                let recipient = Arc::new(recipient);
                for channel in channels.iter() {
                    if !channel.accepts(&recipient) {
                        continue;
                    }
                    let channel = Arc::clone(channel);
                    let recipient = Arc::clone(&recipient);
                    let notice = Arc::clone(&notice);
                    set.spawn(async move {
                        let result = channel.deliver(&recipient, &notice).await;
                        (channel.name(), recipient.user_id, result)
                    });
                }
            }

            let mut summary = DispatchSummary::default();
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((_, _, Ok(()))) => summary.delivered += 1,
                    Ok((channel, user_id, Err(e))) => {
                        summary.failed += 1;
                        tracing::warn!(channel, user_id, error = %e, "Notification delivery failed");
                    }
                    Err(e) => {
                        summary.failed += 1;
                        tracing::error!(error = %e, "Notification task panicked");
                    }
                }
            }

            tracing::debug!(
                subject = %notice.subject,
                delivered = summary.delivered,
                failed = summary.failed,
                "Notification fan-out finished"
            );
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(i32, String)>>,
        fail_for: Option<i32>,
    }

    #[async_trait]
    impl NotificationChannel for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn accepts(&self, recipient: &Recipient) -> bool {
            recipient.email.is_some()
        }

        async fn deliver(&self, recipient: &Recipient, notice: &Notice) -> anyhow::Result<()> {
            if self.fail_for == Some(recipient.user_id) {
                anyhow::bail!("mailbox full");
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.user_id, notice.subject.clone()));
            Ok(())
        }
    }

    fn recipient(user_id: i32, email: Option<&str>) -> Recipient {
        Recipient {
            user_id,
            name: format!("user{user_id}"),
            email: email.map(str::to_string),
            phone: None,
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_block_others() {
        let channel = Arc::new(Recording {
            fail_for: Some(2),
            ..Default::default()
        });
        let dispatcher = NotificationDispatcher::new(vec![channel.clone() as Arc<dyn NotificationChannel>]);

        let summary = dispatcher
            .dispatch(
                vec![
                    recipient(1, Some("a@campus.edu")),
                    recipient(2, Some("b@campus.edu")),
                    recipient(3, Some("c@campus.edu")),
                ],
                Notice::new("New Issue Reported", "body"),
            )
            .await
            .unwrap();

        assert_eq!(summary, DispatchSummary { delivered: 2, failed: 1 });
        let mut ids: Vec<i32> = channel.sent.lock().unwrap().iter().map(|(id, _)| *id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn unreachable_and_duplicate_recipients_are_skipped() {
        let channel = Arc::new(Recording::default());
        let dispatcher = NotificationDispatcher::new(vec![channel.clone() as Arc<dyn NotificationChannel>]);

        let summary = dispatcher
            .dispatch(
                vec![
                    recipient(1, Some("a@campus.edu")),
                    recipient(1, Some("a@campus.edu")),
                    recipient(4, None),
                ],
                Notice::new("subject", "body"),
            )
            .await
            .unwrap();

        assert_eq!(summary, DispatchSummary { delivered: 1, failed: 0 });
    }

    #[tokio::test]
    async fn no_channels_is_a_no_op() {
        let dispatcher = NotificationDispatcher::default();
        assert_eq!(dispatcher.channel_count(), 0);
        let summary = dispatcher
            .dispatch(vec![recipient(1, Some("a@campus.edu"))], Notice::new("s", "b"))
            .await
            .unwrap();
        assert_eq!(summary, DispatchSummary::default());
    }

    #[test]
    fn blank_contact_fields_are_dropped() {
        let now = chrono::Utc::now().naive_utc();
        let user = UserModel {
            id: 9,
            college_id: "C9".into(),
            password_hash: String::new(),
            name: "Nia".into(),
            role: crate::models::Role::User,
            department: None,
            email: Some("  ".into()),
            phone: Some("+100".into()),
            created_at: now,
            updated_at: now,
        };
        let r = Recipient::from(user);
        assert_eq!(r.email, None);
        assert_eq!(r.phone.as_deref(), Some("+100"));
    }
}
