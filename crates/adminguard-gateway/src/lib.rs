//! AdminGuard gateway library entry.
//!
//! Wires the admission gate, audit recorder, notification workers and the
//! admin HTTP handlers into one axum application. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod audit;
pub mod config;
pub mod context;
pub mod notify;
pub mod obs;
pub mod ops;
pub mod pipeline;
pub mod policy;
pub mod providers;
pub mod router;
