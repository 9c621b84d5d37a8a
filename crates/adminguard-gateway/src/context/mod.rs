//! Request context shared across layers.
//!
//! `Caller` carries the authenticated principal and the network address the
//! request came from, independent of the handler that consumes it.

pub mod caller;

pub use caller::{client_ip, Caller};
