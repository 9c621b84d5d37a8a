use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::time::timeout;

use super::job::{NoticeContext, NotificationJob};
use super::NotifyError;
use crate::obs::metrics::GatewayMetrics;
use crate::providers::{CloudCustomerDirectory, NotificationSender, UserDirectory, UserProfile};

/// Collaborators and settings for one fan-out.
pub struct FanOutDeps {
    pub directory: Arc<dyn UserDirectory>,
    pub cloud: Arc<dyn CloudCustomerDirectory>,
    pub sender: Arc<dyn NotificationSender>,
    pub site_url: String,
    pub cws_url: String,
    pub delivery_timeout: Duration,
    pub metrics: Arc<GatewayMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// False when the recipient set could not be resolved; nothing was sent.
    pub resolved: bool,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

struct Recipient {
    email: String,
    locale: String,
    is_workspace_owner: bool,
}

/// Deliver `job` to every recipient independently. Never fails.
pub async fn fan_out(job: &NotificationJob, deps: &FanOutDeps) -> FanOutReport {
    let admins = match deps.directory.list_administrators().await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(kind = job.kind.as_str(), error = %e, "failed to list administrators; notification dropped");
            return FanOutReport::default();
        }
    };

    let initiator = match deps.directory.profile(&job.actor_id).await {
        Ok(Some(p)) => p,
        Ok(None) => bare_profile(&job.actor_id),
        Err(e) => {
            tracing::error!(actor = %job.actor_id, error = %e, "failed to get initiating user");
            bare_profile(&job.actor_id)
        }
    };

    let owner = if job.is_cloud {
        match deps.cloud.workspace_owner_email(&job.actor_id).await {
            Ok(o) => o.filter(|e| !e.is_empty()),
            Err(e) => {
                tracing::error!(actor = %job.actor_id, error = %e, "failed to get cloud workspace owner");
                None
            }
        }
    } else {
        None
    };

    let recipients = resolve_recipients(admins, owner.as_deref());

    let mut futs = FuturesUnordered::new();
    for r in &recipients {
        let ctx = NoticeContext {
            kind: job.kind,
            locale: r.locale.clone(),
            initiator: initiator.clone(),
            site_url: deps.site_url.clone(),
            cws_url: deps.cws_url.clone(),
            is_workspace_owner: r.is_workspace_owner,
            payload: job.payload.clone(),
        };
        futs.push(async move {
            let res = match timeout(deps.delivery_timeout, deps.sender.send(&r.email, &ctx)).await {
                Ok(res) => res,
                Err(_) => Err(NotifyError::Timeout),
            };
            (r.email.as_str(), res)
        });
    }

    let mut report = FanOutReport {
        resolved: true,
        attempted: recipients.len(),
        ..FanOutReport::default()
    };
    while let Some((email, res)) = futs.next().await {
        match res {
            Ok(()) => {
                report.delivered += 1;
                deps.metrics.notification_deliveries.inc(&[("outcome", "delivered")]);
            }
            Err(e) => {
                report.failed += 1;
                deps.metrics.notification_deliveries.inc(&[("outcome", "failed")]);
                tracing::error!(kind = job.kind.as_str(), to = %email, error = %e, "notification delivery failed");
            }
        }
    }
    report
}

/// Administrators plus the workspace owner, deduplicated by case-insensitive email.
fn resolve_recipients(admins: Vec<UserProfile>, owner: Option<&str>) -> Vec<Recipient> {
    let owner_key = owner.map(str::to_lowercase);
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(admins.len() + 1);

    for a in admins {
        let key = a.email.to_lowercase();
        if a.email.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        out.push(Recipient {
            is_workspace_owner: owner_key.as_deref() == Some(key.as_str()),
            email: a.email,
            locale: a.locale,
        });
    }
    if let (Some(email), Some(key)) = (owner, owner_key) {
        if seen.insert(key) {
            out.push(Recipient {
                email: email.to_owned(),
                locale: "en".into(),
                is_workspace_owner: true,
            });
        }
    }
    out
}

fn bare_profile(user_id: &str) -> UserProfile {
    UserProfile {
        id: user_id.to_owned(),
        email: String::new(),
        locale: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(email: &str) -> UserProfile {
        UserProfile {
            id: email.to_owned(),
            email: email.to_owned(),
            locale: "fr".into(),
        }
    }

    #[test]
    fn owner_who_is_admin_is_not_duplicated() {
        let r = resolve_recipients(vec![admin("a@x.io"), admin("Owner@x.io")], Some("owner@X.io"));
        assert_eq!(r.len(), 2);
        assert!(!r[0].is_workspace_owner);
        assert!(r[1].is_workspace_owner);
        assert_eq!(r[1].locale, "fr");
    }

    #[test]
    fn owner_outside_admins_is_added() {
        let r = resolve_recipients(vec![admin("a@x.io"), admin("A@x.io")], Some("boss@x.io"));
        let emails: Vec<_> = r.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, ["a@x.io", "boss@x.io"]);
        assert!(r[1].is_workspace_owner);
    }
}
