use std::sync::Arc;

use adminguard_core::audit::{AuditError, AuditLevel, AuditRecord, AuditState, Auditable};
use adminguard_core::resource::{new_id, now_millis};

use super::sink::AuditSink;
use crate::context::Caller;
use crate::obs::metrics::GatewayMetrics;

#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    metrics: Arc<GatewayMetrics>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { sink, metrics }
    }

    /// Open a `Pending` record for `action` on behalf of `caller`.
    pub fn open(&self, action: &str, caller: &Caller, level: AuditLevel) -> AuditScope {
        let record = AuditRecord::new(
            new_id(),
            action,
            caller.user_id(),
            caller.client_ip.as_str(),
            level,
            now_millis(),
        );
        AuditScope {
            record: Some(record),
            sink: Arc::clone(&self.sink),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Exclusive handle on one open record. Consumed by finalization.
pub struct AuditScope {
    record: Option<AuditRecord>,
    sink: Arc<dyn AuditSink>,
    metrics: Arc<GatewayMetrics>,
}

impl AuditScope {
    pub fn add_parameter<V>(&mut self, key: &str, value: &V) -> Result<(), AuditError>
    where
        V: Auditable + ?Sized,
    {
        match self.record.as_mut() {
            Some(r) => r.add_parameter(key, value),
            None => Err(AuditError::AlreadyFinalized(AuditState::Fail)),
        }
    }

    pub fn success(mut self) {
        self.finish(AuditState::Success, None);
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        self.finish(AuditState::Fail, Some(reason.into()));
    }

    fn finish(&mut self, outcome: AuditState, error: Option<String>) {
        let Some(mut record) = self.record.take() else {
            return;
        };
        if let Err(e) = record.finalize(outcome, error, now_millis()) {
            tracing::error!(action = %record.action, error = %e, "audit finalize rejected");
        }

        self.metrics.audit_records.inc(&[
            ("action", record.action.as_str()),
            ("outcome", record.state().as_str()),
        ]);
        if let Err(e) = self.sink.append(&record) {
            self.metrics.audit_sink_errors.inc(&[]);
            tracing::error!(action = %record.action, record_id = %record.id, error = %e, "audit sink write failed");
        }
    }
}

impl Drop for AuditScope {
    fn drop(&mut self) {
        if self.record.is_some() {
            tracing::warn!("audit record dropped before finalize");
            self.finish(AuditState::Fail, Some("dropped before finalize".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use adminguard_core::principal::Principal;

    struct BrokenSink;

    impl AuditSink for BrokenSink {
        fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Sink("disk full".into()))
        }
    }

    fn caller() -> Caller {
        Caller::new(Principal::new("u1", vec![]), "10.1.1.1")
    }

    #[test]
    fn dropped_scope_is_finalized_as_fail() {
        let sink = Arc::new(MemoryAuditSink::new());
        let rec = AuditRecorder::new(sink.clone(), Arc::new(GatewayMetrics::default()));
        {
            let mut scope = rec.open("applyIPFilters", &caller(), AuditLevel::Content);
            scope.add_parameter("IPFilter", "x").unwrap();
        }
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state(), AuditState::Fail);
        assert_eq!(records[0].error(), Some("dropped before finalize"));
        assert_eq!(records[0].client_ip, "10.1.1.1");
    }

    #[test]
    fn success_emits_exactly_once() {
        let sink = Arc::new(MemoryAuditSink::new());
        let metrics = Arc::new(GatewayMetrics::default());
        let rec = AuditRecorder::new(sink.clone(), metrics.clone());
        rec.open("a", &caller(), AuditLevel::Api).success();
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].state(), AuditState::Success);
        assert_eq!(metrics.audit_records.get(&[("action", "a"), ("outcome", "success")]), 1);
    }

    #[test]
    fn sink_failure_is_contained() {
        let metrics = Arc::new(GatewayMetrics::default());
        let rec = AuditRecorder::new(Arc::new(BrokenSink), metrics.clone());
        rec.open("a", &caller(), AuditLevel::Api).fail("store down");
        assert_eq!(metrics.audit_sink_errors.get(&[]), 1);
    }
}
