//! YAML configuration: strict parsing followed by semantic validation.
//!
//! Unknown keys fail at parse time; out-of-range values and dangling role or
//! permission references fail in [`GatewayConfig::validate`].

pub mod schema;

use std::path::Path;

use adminguard_core::error::{AdminGuardError, Result};

pub use schema::{
    AuditSection, AuditSinkKind, GatewayConfig, GatewaySection, LicenseSection,
    NotificationSection, UserConfig,
};

pub const DEFAULT_PATH: &str = "adminguard.yaml";

/// Config path from the first CLI argument (after the program name).
pub fn path_from_args(mut args: impl Iterator<Item = String>) -> String {
    args.nth(1).unwrap_or_else(|| DEFAULT_PATH.to_string())
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AdminGuardError::Internal(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&raw)
}

pub fn load_from_str(raw: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(raw)
        .map_err(|e| AdminGuardError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
