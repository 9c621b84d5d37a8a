//! Audit record state machine.
//!
//! A record is created `Pending`, collects named parameters, and is finalized
//! exactly once as `Success` or `Fail`. Finalized records are immutable; the
//! gateway hands them to an append-only sink.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Outcome state of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditState {
    Pending,
    Success,
    Fail,
}

impl AuditState {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditState::Pending => "pending",
            AuditState::Success => "success",
            AuditState::Fail => "fail",
        }
    }
}

/// Verbosity class of a record. `Content` records carry full request payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Api,
    Content,
}

/// Programming errors in audit record usage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("duplicate audit parameter: {0}")]
    DuplicateParameter(String),
    #[error("audit record already finalized as {0:?}")]
    AlreadyFinalized(AuditState),
    #[error("audit record cannot be finalized as pending")]
    PendingOutcome,
    #[error("audit sink: {0}")]
    Sink(String),
}

/// Values that can be attached to an audit record.
///
/// Implementations decide what is safe to persist: secrets must be redacted.
pub trait Auditable {
    fn audit_value(&self) -> Value;
}

impl Auditable for str {
    fn audit_value(&self) -> Value {
        Value::String(self.to_owned())
    }
}

impl Auditable for String {
    fn audit_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl<T: Auditable> Auditable for [T] {
    fn audit_value(&self) -> Value {
        Value::Array(self.iter().map(Auditable::audit_value).collect())
    }
}

impl<T: Auditable> Auditable for Vec<T> {
    fn audit_value(&self) -> Value {
        self.as_slice().audit_value()
    }
}

/// One named parameter captured on a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditParameter {
    pub key: String,
    pub value: Value,
}

/// Immutable log entry for one attempted action.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: String,
    pub action: String,
    pub actor_id: String,
    pub client_ip: String,
    pub level: AuditLevel,
    state: AuditState,
    parameters: Vec<AuditParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    pub created_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    finalized_at_ms: Option<u64>,
}

impl AuditRecord {
    pub fn new(
        id: impl Into<String>,
        action: impl Into<String>,
        actor_id: impl Into<String>,
        client_ip: impl Into<String>,
        level: AuditLevel,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            actor_id: actor_id.into(),
            client_ip: client_ip.into(),
            level,
            state: AuditState::Pending,
            parameters: Vec::new(),
            error: None,
            created_at_ms,
            finalized_at_ms: None,
        }
    }

    pub fn state(&self) -> AuditState {
        self.state
    }

    pub fn parameters(&self) -> &[AuditParameter] {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.iter().find(|p| p.key == key).map(|p| &p.value)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn finalized_at_ms(&self) -> Option<u64> {
        self.finalized_at_ms
    }

    /// Attach a parameter. Keys are unique per record; a repeated key is rejected
    /// and the record is left unchanged.
    pub fn add_parameter<V>(&mut self, key: &str, value: &V) -> Result<(), AuditError>
    where
        V: Auditable + ?Sized,
    {
        if self.state != AuditState::Pending {
            return Err(AuditError::AlreadyFinalized(self.state));
        }
        if self.parameters.iter().any(|p| p.key == key) {
            return Err(AuditError::DuplicateParameter(key.to_owned()));
        }
        self.parameters.push(AuditParameter {
            key: key.to_owned(),
            value: value.audit_value(),
        });
        Ok(())
    }

    /// Transition `Pending` to `outcome`. Only valid once, and only to a terminal state.
    pub fn finalize(
        &mut self,
        outcome: AuditState,
        error: Option<String>,
        at_ms: u64,
    ) -> Result<(), AuditError> {
        if self.state != AuditState::Pending {
            return Err(AuditError::AlreadyFinalized(self.state));
        }
        if outcome == AuditState::Pending {
            return Err(AuditError::PendingOutcome);
        }
        self.state = outcome;
        self.error = error;
        self.finalized_at_ms = Some(at_ms);
        Ok(())
    }
}
