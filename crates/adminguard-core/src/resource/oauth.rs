//! Outgoing OAuth connections.
//!
//! Secrets never leave the gateway: responses use [`OutgoingOAuthConnection::sanitized`]
//! and audit values omit them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::audit::Auditable;
use crate::error::{AdminGuardError, Result};

use super::Validate;

const MAX_NAME_CHARS: usize = 64;
const MAX_CLIENT_FIELD_CHARS: usize = 255;
const DEFAULT_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    Password,
}

/// Stored connection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingOAuthConnection {
    pub id: String,
    pub creator_id: String,
    pub create_at: u64,
    pub update_at: u64,
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_password: Option<String>,
    pub oauth_token_url: String,
    pub grant_type: GrantType,
    pub audiences: Vec<String>,
}

impl OutgoingOAuthConnection {
    /// Build a new record from a validated create request.
    pub fn from_input(id: String, creator_id: String, now_ms: u64, input: OAuthConnectionInput) -> Self {
        Self {
            id,
            creator_id,
            create_at: now_ms,
            update_at: now_ms,
            name: input.name,
            client_id: input.client_id,
            client_secret: input.client_secret,
            credentials_username: input.credentials_username,
            credentials_password: input.credentials_password,
            oauth_token_url: input.oauth_token_url,
            grant_type: input.grant_type,
            audiences: input.audiences,
        }
    }

    /// Apply an update. Empty secrets keep the stored ones; credentials are
    /// dropped when the grant no longer uses them. The record is left
    /// untouched if the merged result is incomplete.
    pub fn apply_update(&mut self, input: OAuthConnectionInput, now_ms: u64) -> Result<()> {
        let mut next = self.clone();
        next.name = input.name;
        next.client_id = input.client_id;
        if !input.client_secret.is_empty() {
            next.client_secret = input.client_secret;
        }
        next.grant_type = input.grant_type;
        if next.grant_type == GrantType::Password {
            next.credentials_username = input.credentials_username;
            if input.credentials_password.as_deref().is_some_and(|p| !p.is_empty()) {
                next.credentials_password = input.credentials_password;
            }
        } else {
            next.credentials_username = None;
            next.credentials_password = None;
        }
        next.oauth_token_url = input.oauth_token_url;
        next.audiences = input.audiences;
        next.update_at = now_ms;

        next.check_credentials()?;
        *self = next;
        Ok(())
    }

    /// A password grant needs both stored credentials.
    fn check_credentials(&self) -> Result<()> {
        if self.grant_type != GrantType::Password {
            return Ok(());
        }
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if !present(&self.credentials_username) || !present(&self.credentials_password) {
            return Err(AdminGuardError::BadRequest(
                "password grant requires credentials_username and credentials_password".into(),
            ));
        }
        Ok(())
    }

    /// Copy with secrets blanked, for responses and notification payloads.
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();
        out.client_secret.clear();
        out.credentials_password = None;
        out
    }
}

impl Auditable for OutgoingOAuthConnection {
    fn audit_value(&self) -> Value {
        json!({
            "id": self.id,
            "creator_id": self.creator_id,
            "name": self.name,
            "client_id": self.client_id,
            "oauth_token_url": self.oauth_token_url,
            "grant_type": self.grant_type,
            "audiences": self.audiences,
        })
    }
}

/// Client-supplied connection fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthConnectionInput {
    pub name: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub credentials_username: Option<String>,
    #[serde(default)]
    pub credentials_password: Option<String>,
    pub oauth_token_url: String,
    pub grant_type: GrantType,
    pub audiences: Vec<String>,
}

impl OAuthConnectionInput {
    fn check(&self, require_secrets: bool) -> Result<()> {
        bounded("name", &self.name, MAX_NAME_CHARS)?;
        bounded("client_id", &self.client_id, MAX_CLIENT_FIELD_CHARS)?;
        if require_secrets || !self.client_secret.is_empty() {
            bounded("client_secret", &self.client_secret, MAX_CLIENT_FIELD_CHARS)?;
        }
        http_url("oauth_token_url", &self.oauth_token_url)?;

        if self.grant_type == GrantType::Password {
            let user = self.credentials_username.as_deref().unwrap_or_default();
            bounded("credentials_username", user, MAX_CLIENT_FIELD_CHARS)?;
            let pass = self.credentials_password.as_deref().unwrap_or_default();
            if require_secrets || !pass.is_empty() {
                bounded("credentials_password", pass, MAX_CLIENT_FIELD_CHARS)?;
            }
        }

        if self.audiences.is_empty() {
            return Err(AdminGuardError::BadRequest("audiences must not be empty".into()));
        }
        for a in &self.audiences {
            http_url("audiences", a)?;
        }
        Ok(())
    }
}

impl Auditable for OAuthConnectionInput {
    fn audit_value(&self) -> Value {
        json!({
            "name": self.name,
            "client_id": self.client_id,
            "oauth_token_url": self.oauth_token_url,
            "grant_type": self.grant_type,
            "audiences": self.audiences,
        })
    }
}

/// Create request: every secret must be present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CreateOAuthConnection(pub OAuthConnectionInput);

impl Validate for CreateOAuthConnection {
    fn validate(&self) -> Result<()> {
        self.0.check(true)
    }
}

impl Auditable for CreateOAuthConnection {
    fn audit_value(&self) -> Value {
        self.0.audit_value()
    }
}

/// Update request: empty secrets mean "keep the stored value".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct UpdateOAuthConnection(pub OAuthConnectionInput);

impl Validate for UpdateOAuthConnection {
    fn validate(&self) -> Result<()> {
        self.0.check(false)
    }
}

impl Auditable for UpdateOAuthConnection {
    fn audit_value(&self) -> Value {
        self.0.audit_value()
    }
}

/// Keyset pagination over connections ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub from_id: Option<String>,
    pub limit: usize,
}

impl ListFilter {
    pub fn new(from_id: Option<String>, limit: Option<usize>) -> Result<Self> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(AdminGuardError::BadRequest(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            )));
        }
        Ok(Self {
            from_id: from_id.filter(|s| !s.is_empty()),
            limit,
        })
    }
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            from_id: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

fn bounded(field: &str, value: &str, max: usize) -> Result<()> {
    let n = value.chars().count();
    if n == 0 || n > max {
        return Err(AdminGuardError::BadRequest(format!(
            "{field} must be 1..={max} characters"
        )));
    }
    Ok(())
}

fn http_url(field: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value)
        .map_err(|e| AdminGuardError::BadRequest(format!("{field}: invalid url {value}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        _ => Err(AdminGuardError::BadRequest(format!(
            "{field}: url must be http(s) with a host: {value}"
        ))),
    }
}
