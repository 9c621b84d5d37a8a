//! Shared error type across adminguard crates.

use thiserror::Error;

use crate::capability::Permission;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed body.
    BadRequest,
    /// Missing or unknown session.
    AuthFailed,
    /// Capability not available (license, SKU, or feature toggle).
    NotImplemented,
    /// Principal lacks the required permission.
    Forbidden,
    /// Addressed resource does not exist.
    NotFound,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::NotImplemented => "NOT_IMPLEMENTED",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AdminGuardError>;

/// Unified error type used by core and gateway.
///
/// Admission failures caused by license state or feature toggles all map to
/// [`AdminGuardError::NotAvailable`]; its message never says which check failed.
#[derive(Debug, Error)]
pub enum AdminGuardError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("feature not available")]
    NotAvailable,
    #[error("missing permission: {0}")]
    Forbidden(Permission),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl AdminGuardError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            AdminGuardError::BadRequest(_) => ClientCode::BadRequest,
            AdminGuardError::AuthFailed => ClientCode::AuthFailed,
            AdminGuardError::NotAvailable => ClientCode::NotImplemented,
            AdminGuardError::Forbidden(_) => ClientCode::Forbidden,
            AdminGuardError::NotFound(_) => ClientCode::NotFound,
            AdminGuardError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            AdminGuardError::Internal(_) => ClientCode::Internal,
        }
    }
}
