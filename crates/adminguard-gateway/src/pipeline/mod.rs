//! Gate-and-commit pipeline.
//!
//! Every protected handler starts with [`Pipeline::admit`]. The returned
//! [`Admitted`] token is the only way to reach the store:
//!
//! - reads: `admit` -> [`Admitted::read`]
//! - writes: `admit` -> [`Admitted::decode`] -> [`Admitted::commit`]
//!
//! `commit` opens the audit record, runs the mutation, finalizes the record
//! and enqueues the notification job before returning the result. Admission
//! and decode failures return before any record is opened.

use std::future::Future;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;

use adminguard_core::audit::{AuditLevel, Auditable};
use adminguard_core::capability::Capability;
use adminguard_core::error::{AdminGuardError, Result};
use adminguard_core::license::License;
use adminguard_core::resource::{decode_json, Validate};

use crate::audit::AuditRecorder;
use crate::context::Caller;
use crate::notify::{NoticeKind, NotificationJob, NotificationQueue};
use crate::policy::Gate;

/// Per-endpoint description of a write.
#[derive(Debug, Clone, Copy)]
pub struct WriteAction {
    pub capability: &'static Capability,
    pub level: AuditLevel,
    /// Audit parameter key the decoded payload is recorded under.
    pub param: &'static str,
    pub notice: NoticeKind,
}

#[derive(Clone)]
pub struct Pipeline {
    gate: Gate,
    audit: AuditRecorder,
    notifications: NotificationQueue,
}

impl Pipeline {
    pub fn new(gate: Gate, audit: AuditRecorder, notifications: NotificationQueue) -> Self {
        Self {
            gate,
            audit,
            notifications,
        }
    }

    /// Run the gate for `cap`. A denial becomes the one error the caller sees.
    pub fn admit<'a>(
        &'a self,
        cap: &'static Capability,
        caller: &'a Caller,
    ) -> Result<Admitted<'a>> {
        let started = Instant::now();
        let admission = self.gate.admit(cap, &caller.principal);
        if let Err(e) = admission.decision.into_result() {
            tracing::info!(
                action = cap.name,
                user = caller.user_id(),
                reason = admission.decision.reason.as_str(),
                "request not admitted"
            );
            return Err(e);
        }
        Ok(Admitted {
            pipeline: self,
            cap,
            caller,
            license: admission.license,
            started,
        })
    }
}

/// Proof that the gate allowed `cap` for `caller` in this request.
pub struct Admitted<'a> {
    pipeline: &'a Pipeline,
    cap: &'static Capability,
    caller: &'a Caller,
    license: Option<License>,
    started: Instant,
}

impl<'a> Admitted<'a> {
    pub fn caller(&self) -> &Caller {
        self.caller
    }

    /// Decode and validate a request body. Nothing is audited on failure.
    pub fn decode<T>(&self, body: &[u8]) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        decode_json(body).inspect_err(|e| {
            tracing::info!(action = self.cap.name, error = %e, "request body rejected");
        })
    }

    /// Run a read against the store. Not audited.
    pub async fn read<T, Fut>(self, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let out = fut.await.map_err(|e| store_error(self.cap, e));
        self.observe();
        out
    }

    /// Audit, mutate, and enqueue the post-commit notification.
    ///
    /// The returned value is what the caller receives and what the notification
    /// payload is built from, so it must already be sanitized.
    pub async fn commit<P, T, F, Fut>(self, action: WriteAction, payload: P, mutate: F) -> Result<T>
    where
        P: Auditable,
        T: Serialize,
        F: FnOnce(P) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut audit = self.pipeline.audit.open(self.cap.name, self.caller, action.level);
        if let Err(e) = audit.add_parameter(action.param, &payload) {
            tracing::error!(action = self.cap.name, error = %e, "audit parameter rejected");
        }

        let result = match mutate(payload).await {
            Ok(r) => r,
            Err(e) => {
                audit.fail(e.to_string());
                self.observe();
                return Err(store_error(self.cap, e));
            }
        };
        audit.success();

        let payload = serde_json::to_value(&result).unwrap_or_else(|e| {
            tracing::error!(action = self.cap.name, error = %e, "notification payload not serializable");
            serde_json::Value::Null
        });
        self.pipeline.notifications.enqueue(NotificationJob {
            kind: action.notice,
            actor_id: self.caller.user_id().to_owned(),
            payload,
            is_cloud: self.license.as_ref().is_some_and(|l| l.is_cloud),
        });

        self.observe();
        Ok(result)
    }

    fn observe(&self) {
        self.pipeline
            .gate
            .metrics()
            .action_duration
            .observe(&[("action", self.cap.name)], self.started.elapsed());
    }
}

/// Store failures surface as internal errors. A missing resource stays a 404
/// and a merge the store refuses stays a 400.
fn store_error(cap: &Capability, e: AdminGuardError) -> AdminGuardError {
    match e {
        AdminGuardError::NotFound(_) | AdminGuardError::BadRequest(_) => e,
        other => {
            tracing::error!(action = cap.name, error = %other, "store call failed");
            AdminGuardError::Internal(format!("{} failed", cap.name))
        }
    }
}
