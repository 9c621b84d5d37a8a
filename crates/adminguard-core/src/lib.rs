//! adminguard core: transport-agnostic admission, audit, and resource types.
//!
//! This crate defines the capability descriptors, the admission evaluation
//! order, the audit record state machine, the protected resource models, and
//! the error surface shared by the gateway and its tests. It carries no
//! transport or runtime dependencies.
//!
//! # Lints
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `AdminGuardError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod audit;
pub mod capability;
pub mod error;
pub mod license;
pub mod principal;
pub mod resource;

/// Shared result type.
pub use error::{AdminGuardError, Result};
