//! In-process providers seeded from config.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;

use adminguard_core::error::{AdminGuardError, Result};
use adminguard_core::license::License;
use adminguard_core::principal::Principal;
use adminguard_core::resource::{
    AllowedIpRanges, ListFilter, OAuthConnectionInput, OutgoingOAuthConnection, now_millis,
};

use super::{
    CloudCustomerDirectory, FeatureFlagProvider, IpFilterStore, LicenseProvider,
    OAuthConnectionStore, SessionResolver, UserDirectory, UserProfile,
};
use crate::config::UserConfig;
use crate::notify::NotifyError;

/// License that can be swapped at runtime (install / remove).
#[derive(Debug, Default)]
pub struct StaticLicense {
    inner: RwLock<Option<License>>,
}

impl StaticLicense {
    pub fn new(license: Option<License>) -> Self {
        Self {
            inner: RwLock::new(license),
        }
    }

    pub fn set(&self, license: Option<License>) {
        if let Ok(mut g) = self.inner.write() {
            *g = license;
        }
    }
}

impl LicenseProvider for StaticLicense {
    fn current_license(&self) -> Option<License> {
        // Poisoned lock reads as "no license": deny rather than panic.
        self.inner.read().ok().and_then(|g| g.clone())
    }
}

/// Feature toggles; unknown flags are off.
#[derive(Debug, Default)]
pub struct MemoryFeatureFlags {
    flags: DashMap<String, bool>,
}

impl MemoryFeatureFlags {
    pub fn new<'a>(flags: impl IntoIterator<Item = (&'a String, &'a bool)>) -> Self {
        let this = Self::default();
        for (k, v) in flags {
            this.flags.insert(k.clone(), *v);
        }
        this
    }

    pub fn set(&self, flag: impl Into<String>, enabled: bool) {
        self.flags.insert(flag.into(), enabled);
    }
}

impl FeatureFlagProvider for MemoryFeatureFlags {
    fn is_enabled(&self, flag: &str) -> bool {
        self.flags.get(flag).map(|v| *v).unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct MemorySessions {
    tokens: DashMap<String, Principal>,
}

impl MemorySessions {
    pub fn from_users(users: &[UserConfig]) -> Self {
        let this = Self::default();
        for u in users {
            if let Some(t) = &u.session_token {
                this.insert(t.clone(), Principal::new(u.id.as_str(), u.roles.clone()));
            }
        }
        this
    }

    pub fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.tokens.insert(token.into(), principal);
    }
}

impl SessionResolver for MemorySessions {
    fn resolve(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).map(|p| p.value().clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: BTreeMap<String, (UserProfile, bool)>,
}

impl MemoryUserDirectory {
    pub fn from_users(users: &[UserConfig]) -> Self {
        let users = users
            .iter()
            .map(|u| {
                let profile = UserProfile {
                    id: u.id.clone(),
                    email: u.email.clone(),
                    locale: u.locale.clone(),
                };
                (u.id.clone(), (profile, u.system_admin))
            })
            .collect();
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn list_administrators(&self) -> std::result::Result<Vec<UserProfile>, NotifyError> {
        Ok(self
            .users
            .values()
            .filter(|(_, admin)| *admin)
            .map(|(p, _)| p.clone())
            .collect())
    }

    async fn profile(&self, user_id: &str) -> std::result::Result<Option<UserProfile>, NotifyError> {
        Ok(self.users.get(user_id).map(|(p, _)| p.clone()))
    }
}

/// Single-workspace cloud customer: every user maps to the same owner.
#[derive(Debug, Default)]
pub struct MemoryCloudDirectory {
    owner_email: Option<String>,
}

impl MemoryCloudDirectory {
    pub fn new(owner_email: Option<String>) -> Self {
        Self { owner_email }
    }
}

#[async_trait]
impl CloudCustomerDirectory for MemoryCloudDirectory {
    async fn workspace_owner_email(
        &self,
        _user_id: &str,
    ) -> std::result::Result<Option<String>, NotifyError> {
        Ok(self.owner_email.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryIpFilterStore {
    ranges: tokio::sync::RwLock<AllowedIpRanges>,
}

#[async_trait]
impl IpFilterStore for MemoryIpFilterStore {
    async fn get_filters(&self) -> Result<AllowedIpRanges> {
        Ok(self.ranges.read().await.clone())
    }

    async fn apply_filters(&self, ranges: AllowedIpRanges) -> Result<AllowedIpRanges> {
        let mut g = self.ranges.write().await;
        *g = ranges;
        Ok(g.clone())
    }
}

/// Connections keyed by id; ids are time-ordered so key order is creation order.
#[derive(Debug, Default)]
pub struct MemoryOAuthConnectionStore {
    conns: tokio::sync::RwLock<BTreeMap<String, OutgoingOAuthConnection>>,
}

#[async_trait]
impl OAuthConnectionStore for MemoryOAuthConnectionStore {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<OutgoingOAuthConnection>> {
        use std::ops::Bound::{Excluded, Unbounded};

        let g = self.conns.read().await;
        let lower = match &filter.from_id {
            Some(id) => Excluded(id.clone()),
            None => Unbounded,
        };
        Ok(g.range((lower, Unbounded))
            .take(filter.limit)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn get(&self, id: &str) -> Result<OutgoingOAuthConnection> {
        self.conns
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AdminGuardError::NotFound(format!("outgoing oauth connection {id}")))
    }

    async fn create(&self, conn: OutgoingOAuthConnection) -> Result<OutgoingOAuthConnection> {
        let mut g = self.conns.write().await;
        if g.contains_key(&conn.id) {
            return Err(AdminGuardError::Internal(format!("duplicate connection id {}", conn.id)));
        }
        g.insert(conn.id.clone(), conn.clone());
        Ok(conn)
    }

    async fn update(&self, id: &str, input: OAuthConnectionInput) -> Result<OutgoingOAuthConnection> {
        let mut g = self.conns.write().await;
        let conn = g
            .get_mut(id)
            .ok_or_else(|| AdminGuardError::NotFound(format!("outgoing oauth connection {id}")))?;
        conn.apply_update(input, now_millis())?;
        Ok(conn.clone())
    }

    async fn delete(&self, id: &str) -> Result<OutgoingOAuthConnection> {
        self.conns
            .write()
            .await
            .remove(id)
            .ok_or_else(|| AdminGuardError::NotFound(format!("outgoing oauth connection {id}")))
    }
}
