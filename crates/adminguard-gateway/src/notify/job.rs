use serde::Serialize;
use serde_json::Value;

use crate::providers::UserProfile;

/// Which template a notification renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    IpFiltersChanged,
    OAuthConnectionsChanged,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::IpFiltersChanged => "ip_filters_changed",
            NoticeKind::OAuthConnectionsChanged => "oauth_connections_changed",
        }
    }
}

/// Produced after a successful mutation; lives only in memory.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub kind: NoticeKind,
    pub actor_id: String,
    /// Post-mutation resource state, already sanitized.
    pub payload: Value,
    /// Whether the license at commit time was a cloud license.
    pub is_cloud: bool,
}

/// Everything a sender needs to render one recipient's notification.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeContext {
    pub kind: NoticeKind,
    pub locale: String,
    pub initiator: UserProfile,
    pub site_url: String,
    pub cws_url: String,
    pub is_workspace_owner: bool,
    pub payload: Value,
}
