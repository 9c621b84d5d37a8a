use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::fanout::{fan_out, FanOutDeps};
use super::job::NotificationJob;
use crate::obs::metrics::GatewayMetrics;

/// Sending half of the bounded notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationJob>,
    capacity: usize,
    metrics: Arc<GatewayMetrics>,
}

impl NotificationQueue {
    /// Create a queue and the receiver its workers will drain.
    pub fn bounded(
        capacity: usize,
        metrics: Arc<GatewayMetrics>,
    ) -> (Self, mpsc::Receiver<NotificationJob>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, capacity, metrics }, rx)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hand a job off without waiting. A full or closed queue drops the job.
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        let kind = job.kind.as_str();
        // Counted before the send so a worker's decrement never runs first.
        self.metrics.notification_queue_depth.inc(&[]);
        match self.tx.try_send(job) {
            Ok(()) => {
                self.metrics.notifications_enqueued.inc(&[("kind", kind)]);
                true
            }
            Err(e) => {
                self.metrics.notification_queue_depth.dec(&[]);
                self.metrics.notifications_dropped.inc(&[("kind", kind)]);
                tracing::warn!(kind, error = %e, "notification queue rejected job");
                false
            }
        }
    }
}

/// Worker tasks draining the queue. They exit once every queue sender is gone
/// and the remaining jobs are processed.
pub struct NotificationWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl NotificationWorkers {
    pub fn spawn(rx: mpsc::Receiver<NotificationJob>, deps: Arc<FanOutDeps>, workers: usize) -> Self {
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let deps = Arc::clone(&deps);
                tokio::spawn(async move {
                    loop {
                        let next = { rx.lock().await.recv().await };
                        let Some(job) = next else { break };
                        deps.metrics.notification_queue_depth.dec(&[]);

                        let report = fan_out(&job, &deps).await;
                        tracing::info!(
                            worker,
                            kind = job.kind.as_str(),
                            actor = %job.actor_id,
                            resolved = report.resolved,
                            attempted = report.attempted,
                            delivered = report.delivered,
                            failed = report.failed,
                            "notification job finished"
                        );
                    }
                    tracing::debug!(worker, "notification worker stopped");
                })
            })
            .collect();
        Self { handles }
    }

    /// Wait for every worker to drain and stop.
    pub async fn join(self) {
        for h in self.handles {
            if let Err(e) = h.await {
                tracing::error!(error = %e, "notification worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoticeKind;

    fn job() -> NotificationJob {
        NotificationJob {
            kind: NoticeKind::IpFiltersChanged,
            actor_id: "u1".into(),
            payload: serde_json::Value::Null,
            is_cloud: false,
        }
    }

    #[test]
    fn rejected_jobs_leave_the_depth_gauge_unchanged() {
        let metrics = Arc::new(GatewayMetrics::default());
        let (queue, mut rx) = NotificationQueue::bounded(1, Arc::clone(&metrics));

        assert!(queue.enqueue(job()));
        assert!(!queue.enqueue(job()));
        assert_eq!(metrics.notification_queue_depth.get(&[]), 1);

        assert!(rx.try_recv().is_ok());
        drop(rx);
        assert!(!queue.enqueue(job()));
        assert_eq!(metrics.notification_queue_depth.get(&[]), 1);
        assert_eq!(
            metrics.notifications_dropped.get(&[("kind", "ip_filters_changed")]),
            2
        );
    }
}
