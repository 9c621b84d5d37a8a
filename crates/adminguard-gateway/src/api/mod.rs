//! HTTP handlers for the protected action families.
//!
//! Handlers only wire extractors to the pipeline; all admission, audit and
//! notification behaviour lives in [`crate::pipeline`].

pub mod error;
pub mod ip_filtering;
pub mod oauth_connections;

pub use error::ApiError;
