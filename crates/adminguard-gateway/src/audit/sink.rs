use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use adminguard_core::audit::{AuditError, AuditRecord};

/// Lines buffered ahead of the file writer before appends start failing.
const FILE_SINK_BUFFER: usize = 1024;

/// Append-only destination for finalized records. Never read back by the gateway.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Emits each record as a structured event on the `audit` target.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record).map_err(|e| AuditError::Sink(e.to_string()))?;
        tracing::info!(
            target: "audit",
            action = %record.action,
            actor = %record.actor_id,
            outcome = record.state().as_str(),
            record = %json,
            "audit record"
        );
        Ok(())
    }
}

/// JSON-lines file opened in append mode.
///
/// `append` only serializes and queues the line; a blocking writer task owns
/// the file, so request tasks never wait on disk I/O.
#[derive(Debug)]
pub struct FileAuditSink {
    tx: mpsc::Sender<Vec<u8>>,
    writer: JoinHandle<()>,
}

impl FileAuditSink {
    /// Open `path` and start its writer. Must be called inside a tokio runtime.
    pub fn open(path: &str) -> io::Result<Self> {
        let runtime = Handle::try_current().map_err(io::Error::other)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (tx, rx) = mpsc::channel(FILE_SINK_BUFFER);
        let writer = runtime.spawn_blocking(move || write_lines(file, rx));
        Ok(Self { tx, writer })
    }

    /// Stop accepting records and wait until every queued line is written.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.writer.await {
            tracing::error!(target: "audit", error = %e, "audit file writer panicked");
        }
    }
}

fn write_lines(mut file: File, mut rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(line) = rx.blocking_recv() {
        if let Err(e) = file.write_all(&line).and_then(|_| file.flush()) {
            tracing::error!(target: "audit", error = %e, "audit file write failed");
        }
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record).map_err(|e| AuditError::Sink(e.to_string()))?;
        line.push(b'\n');
        self.tx.try_send(line).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => "audit file writer backlogged",
                TrySendError::Closed(_) => "audit file writer stopped",
            };
            AuditError::Sink(reason.into())
        })
    }
}

/// Keeps records in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Sink("memory sink lock poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}
