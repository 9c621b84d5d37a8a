//! Notification senders that do not talk to a mail server.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::NotificationSender;
use crate::notify::{NoticeContext, NotifyError};

/// Logs each notification on the `notify` target.
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, email: &str, ctx: &NoticeContext) -> Result<(), NotifyError> {
        tracing::info!(
            target: "notify",
            to = %email,
            kind = ctx.kind.as_str(),
            locale = %ctx.locale,
            initiator = %ctx.initiator.id,
            workspace_owner = ctx.is_workspace_owner,
            "notification sent"
        );
        Ok(())
    }
}

/// Records deliveries in memory; addresses in `failing` always fail.
#[derive(Debug, Default)]
pub struct OutboxSender {
    sent: Mutex<Vec<(String, NoticeContext)>>,
    failing: HashSet<String>,
}

impl OutboxSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: emails.into_iter().map(Into::into).collect(),
        }
    }

    pub fn sent(&self) -> Vec<(String, NoticeContext)> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSender for OutboxSender {
    async fn send(&self, email: &str, ctx: &NoticeContext) -> Result<(), NotifyError> {
        if self.failing.contains(email) {
            return Err(NotifyError::Send(format!("mailbox unavailable: {email}")));
        }
        if let Ok(mut g) = self.sent.lock() {
            g.push((email.to_owned(), ctx.clone()));
        }
        Ok(())
    }
}
