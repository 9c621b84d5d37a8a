//! IP allow-list entries.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::audit::Auditable;
use crate::error::{AdminGuardError, Result};

use super::Validate;

const MAX_DESCRIPTION_CHARS: usize = 255;

/// One allowed CIDR block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowedIpRange {
    pub cidr_block: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub owner_id: String,
}

impl AllowedIpRange {
    fn check(&self, idx: usize) -> Result<()> {
        parse_cidr(&self.cidr_block).map_err(|msg| {
            AdminGuardError::BadRequest(format!("entry {idx}: {msg}: {}", self.cidr_block))
        })?;
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AdminGuardError::BadRequest(format!(
                "entry {idx}: description longer than {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// The full allow-list. An empty list is valid and clears all filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedIpRanges(pub Vec<AllowedIpRange>);

impl AllowedIpRanges {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Validate for AllowedIpRanges {
    fn validate(&self) -> Result<()> {
        self.0.iter().enumerate().try_for_each(|(i, r)| r.check(i))
    }
}

impl Auditable for AllowedIpRange {
    fn audit_value(&self) -> Value {
        json!({
            "cidr_block": self.cidr_block,
            "description": self.description,
            "enabled": self.enabled,
            "owner_id": self.owner_id,
        })
    }
}

impl Auditable for AllowedIpRanges {
    fn audit_value(&self) -> Value {
        self.0.audit_value()
    }
}

/// Network address the caller is seen from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerAddress {
    pub ip: String,
}

/// Parse `addr/prefix`, checking the prefix against the address family.
pub fn parse_cidr(s: &str) -> std::result::Result<(IpAddr, u8), &'static str> {
    let (addr, prefix) = s.split_once('/').ok_or("missing prefix length")?;
    let addr: IpAddr = addr.trim().parse().map_err(|_| "invalid address")?;
    let prefix: u8 = prefix.trim().parse().map_err(|_| "invalid prefix length")?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err("prefix length out of range");
    }
    Ok((addr, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cidr_parsing() {
        assert!(parse_cidr("10.0.0.0/8").is_ok());
        assert!(parse_cidr("2001:db8::/32").is_ok());
        assert!(parse_cidr("10.0.0.0/33").is_err());
        assert!(parse_cidr("10.0.0.0").is_err());
        assert!(parse_cidr("nope/8").is_err());
        assert!(parse_cidr("::1/129").is_err());
    }
}
