//! Post-commit notification fan-out.
//!
//! Write actions hand a [`NotificationJob`] to a bounded [`NotificationQueue`];
//! [`NotificationWorkers`] drain it off the request path and run [`fan_out`]
//! per job. Delivery is best-effort and at-most-once: failures are logged and
//! counted, never retried, never reported to the requesting caller.

pub mod fanout;
pub mod job;
pub mod worker;

use thiserror::Error;

pub use fanout::{fan_out, FanOutDeps, FanOutReport};
pub use job::{NoticeContext, NoticeKind, NotificationJob};
pub use worker::{NotificationQueue, NotificationWorkers};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("directory lookup failed: {0}")]
    Directory(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("delivery timed out")]
    Timeout,
}
