//! External collaborators consumed by the gate and the pipeline.
//!
//! Everything the gateway reads or mutates outside its own process sits behind
//! one of these traits and is injected through [`crate::app_state::AppParts`].
//! `memory` and `sender` hold the implementations used by the binary when no
//! real backend is wired in.

pub mod memory;
pub mod sender;

use async_trait::async_trait;
use serde::Serialize;

use adminguard_core::capability::Permission;
use adminguard_core::error::Result;
use adminguard_core::license::License;
use adminguard_core::principal::Principal;
use adminguard_core::resource::{
    AllowedIpRanges, ListFilter, OAuthConnectionInput, OutgoingOAuthConnection,
};

use crate::notify::{NoticeContext, NotifyError};

pub use memory::{
    MemoryCloudDirectory, MemoryFeatureFlags, MemoryIpFilterStore, MemoryOAuthConnectionStore,
    MemorySessions, MemoryUserDirectory, StaticLicense,
};
pub use sender::{LogSender, OutboxSender};

pub trait LicenseProvider: Send + Sync {
    fn current_license(&self) -> Option<License>;
}

pub trait FeatureFlagProvider: Send + Sync {
    fn is_enabled(&self, flag: &str) -> bool;
}

pub trait PermissionProvider: Send + Sync {
    fn has_permission(&self, principal: &Principal, permission: Permission) -> bool;
}

/// Maps a bearer token to the principal of an authenticated session.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Principal>;
}

/// Allow-list storage. `apply_filters` replaces the whole list atomically.
#[async_trait]
pub trait IpFilterStore: Send + Sync {
    async fn get_filters(&self) -> Result<AllowedIpRanges>;
    async fn apply_filters(&self, ranges: AllowedIpRanges) -> Result<AllowedIpRanges>;
}

/// Connection storage. Unknown ids yield `AdminGuardError::NotFound`.
#[async_trait]
pub trait OAuthConnectionStore: Send + Sync {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<OutgoingOAuthConnection>>;
    async fn get(&self, id: &str) -> Result<OutgoingOAuthConnection>;
    async fn create(&self, conn: OutgoingOAuthConnection) -> Result<OutgoingOAuthConnection>;
    async fn update(&self, id: &str, input: OAuthConnectionInput) -> Result<OutgoingOAuthConnection>;
    async fn delete(&self, id: &str) -> Result<OutgoingOAuthConnection>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub locale: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_administrators(&self) -> std::result::Result<Vec<UserProfile>, NotifyError>;
    async fn profile(&self, user_id: &str) -> std::result::Result<Option<UserProfile>, NotifyError>;
}

/// Cloud customer lookup; the customer email is the workspace owner.
#[async_trait]
pub trait CloudCustomerDirectory: Send + Sync {
    async fn workspace_owner_email(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<String>, NotifyError>;
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, email: &str, ctx: &NoticeContext) -> std::result::Result<(), NotifyError>;
}
