//! Protected resource models and request-body decoding.
//!
//! Bodies are decoded and structurally validated as a whole: one bad entry
//! rejects the entire request before anything reaches a store.

pub mod ip_filter;
pub mod oauth;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{AdminGuardError, Result};

pub use ip_filter::{AllowedIpRange, AllowedIpRanges, CallerAddress};
pub use oauth::{
    CreateOAuthConnection, GrantType, ListFilter, OAuthConnectionInput, OutgoingOAuthConnection,
    UpdateOAuthConnection,
};

/// Structural validation applied right after decoding.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Decode a JSON body and validate it. Any failure is a client error.
pub fn decode_json<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(body)
        .map_err(|e| AdminGuardError::BadRequest(format!("invalid body: {e}")))?;
    value.validate()?;
    Ok(value)
}

/// Milliseconds since the unix epoch (0 if the clock is before the epoch).
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Time-ordered identifier (UUIDv7, 32 lowercase hex digits). Ids minted by
/// one process sort in creation order.
pub fn new_id() -> String {
    Uuid::now_v7().simple().to_string()
}
