use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use adminguard_core::capability::Permission;
use adminguard_core::error::{AdminGuardError, Result};
use adminguard_core::license::License;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    /// Absent means "no license installed".
    #[serde(default)]
    pub license: Option<LicenseSection>,

    #[serde(default)]
    pub feature_flags: BTreeMap<String, bool>,

    #[serde(default)]
    pub audit: AuditSection,

    #[serde(default)]
    pub notifications: NotificationSection,

    /// role -> permission names (`"*"` grants all).
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AdminGuardError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.audit.validate()?;
        self.notifications.validate()?;

        for (role, perms) in &self.roles {
            for p in perms {
                if p != "*" {
                    p.parse::<Permission>().map_err(|_| {
                        AdminGuardError::BadRequest(format!("roles.{role}: unknown permission {p}"))
                    })?;
                }
            }
        }

        let mut ids = HashSet::new();
        let mut tokens = HashSet::new();
        for u in &self.users {
            if u.id.is_empty() || u.email.is_empty() {
                return Err(AdminGuardError::BadRequest("users: id and email are required".into()));
            }
            if !ids.insert(u.id.as_str()) {
                return Err(AdminGuardError::BadRequest(format!("users: duplicate id {}", u.id)));
            }
            if let Some(t) = &u.session_token {
                if !tokens.insert(t.as_str()) {
                    return Err(AdminGuardError::BadRequest(format!(
                        "users: duplicate session_token for {}",
                        u.id
                    )));
                }
            }
            for r in &u.roles {
                if !self.roles.contains_key(r) {
                    return Err(AdminGuardError::BadRequest(format!(
                        "users.{}: unknown role {r}",
                        u.id
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn license(&self) -> Option<License> {
        self.license
            .as_ref()
            .map(|l| License::new(l.sku_short_name.clone(), l.cloud))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default)]
    pub cws_url: String,

    /// Headers whose first value is trusted as the caller address, in order.
    #[serde(default)]
    pub trusted_proxy_headers: Vec<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            site_url: default_site_url(),
            cws_url: String::new(),
            trusted_proxy_headers: Vec::new(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.site_url.is_empty() {
            return Err(AdminGuardError::BadRequest("gateway.site_url must not be empty".into()));
        }
        for h in &self.trusted_proxy_headers {
            if axum::http::HeaderName::from_bytes(h.as_bytes()).is_err() {
                return Err(AdminGuardError::BadRequest(format!(
                    "gateway.trusted_proxy_headers: invalid header name {h}"
                )));
            }
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8065".into()
}
fn default_site_url() -> String {
    "http://localhost:8065".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseSection {
    pub sku_short_name: String,
    #[serde(default)]
    pub cloud: bool,
    /// Cloud customer contact; only consulted for cloud licenses.
    #[serde(default)]
    pub workspace_owner_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    #[default]
    Tracing,
    File,
    Memory,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    #[serde(default)]
    pub sink: AuditSinkKind,

    /// Required for `sink: file`.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditSection {
    pub fn validate(&self) -> Result<()> {
        if self.sink == AuditSinkKind::File && self.path.as_deref().unwrap_or("").is_empty() {
            return Err(AdminGuardError::BadRequest(
                "audit.path is required when audit.sink is file".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationSection {
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            delivery_timeout_ms: default_delivery_timeout_ms(),
        }
    }
}

impl NotificationSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.workers) {
            return Err(AdminGuardError::BadRequest(
                "notifications.workers must be between 1 and 64".into(),
            ));
        }
        if !(1..=65536).contains(&self.queue_capacity) {
            return Err(AdminGuardError::BadRequest(
                "notifications.queue_capacity must be between 1 and 65536".into(),
            ));
        }
        if !(100..=60000).contains(&self.delivery_timeout_ms) {
            return Err(AdminGuardError::BadRequest(
                "notifications.delivery_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    2
}
fn default_queue_capacity() -> usize {
    256
}
fn default_delivery_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub id: String,
    pub email: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub system_admin: bool,
    /// Static bearer token for this user (development / tests).
    #[serde(default)]
    pub session_token: Option<String>,
}

fn default_locale() -> String {
    "en".into()
}
