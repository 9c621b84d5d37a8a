//! Audit recording: lifecycle guard over a core `AuditRecord` plus sinks.
//!
//! Records are opened when a write action starts and are always finalized,
//! explicitly via [`AuditScope::success`] / [`AuditScope::fail`] or, if the
//! scope is dropped first, as `Fail` by its `Drop` impl. Sink failures are
//! logged and counted; they never affect the action.

pub mod recorder;
pub mod sink;

pub use recorder::{AuditRecorder, AuditScope};
pub use sink::{AuditSink, FileAuditSink, MemoryAuditSink, TracingAuditSink};
