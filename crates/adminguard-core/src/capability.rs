//! Capability descriptors and the admission evaluation order.
//!
//! Every protected action is described by a `'static` [`Capability`]. The
//! [`admit`] function decides whether a request may proceed. Checks run in a
//! fixed order and the first failing check determines the reason:
//!
//! 1. feature toggle enabled
//! 2. license present
//! 3. license SKU in the capability's SKU set
//! 4. principal holds the required permission
//!
//! Later checks are not evaluated once an earlier one fails.

use std::fmt;
use std::str::FromStr;

use crate::error::{AdminGuardError, Result};
use crate::license::License;

/// Permission grants checked by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    ReadIpFilters,
    WriteIpFilters,
    ManageOutgoingOAuthConnections,
}

impl Permission {
    pub const ALL: [Permission; 3] = [
        Permission::ReadIpFilters,
        Permission::WriteIpFilters,
        Permission::ManageOutgoingOAuthConnections,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ReadIpFilters => "sysconsole_read_ip_filters",
            Permission::WriteIpFilters => "sysconsole_write_ip_filters",
            Permission::ManageOutgoingOAuthConnections => "manage_outgoing_oauth_connections",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AdminGuardError;

    fn from_str(s: &str) -> Result<Self> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AdminGuardError::BadRequest(format!("unknown permission: {s}")))
    }
}

/// Immutable, per-action admission requirements.
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    /// Action name; also used as the audit action name.
    pub name: &'static str,
    pub feature_flag: &'static str,
    /// Accepted license SKU short names.
    pub skus: &'static [&'static str],
    /// `None` means the action only needs entitlement, not a grant.
    pub permission: Option<Permission>,
}

/// Why a request was (or was not) admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionReason {
    Allowed,
    FeatureDisabled,
    NoLicense,
    WrongSku,
    PermissionDenied,
}

impl AdmissionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            AdmissionReason::Allowed => "allowed",
            AdmissionReason::FeatureDisabled => "feature_disabled",
            AdmissionReason::NoLicense => "no_license",
            AdmissionReason::WrongSku => "wrong_sku",
            AdmissionReason::PermissionDenied => "permission_denied",
        }
    }
}

/// Result of one admission evaluation. Never cached across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub reason: AdmissionReason,
    /// Permission that was checked, if the evaluation reached step 4.
    pub permission: Option<Permission>,
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        self.reason == AdmissionReason::Allowed
    }

    /// Collapse a denial into the single error the caller gets to see.
    ///
    /// Entitlement and toggle failures are indistinguishable from the outside.
    pub fn into_result(self) -> Result<()> {
        match self.reason {
            AdmissionReason::Allowed => Ok(()),
            AdmissionReason::FeatureDisabled
            | AdmissionReason::NoLicense
            | AdmissionReason::WrongSku => Err(AdminGuardError::NotAvailable),
            AdmissionReason::PermissionDenied => match self.permission {
                Some(p) => Err(AdminGuardError::Forbidden(p)),
                None => Err(AdminGuardError::Internal(
                    "permission denied without a permission".into(),
                )),
            },
        }
    }
}

/// Evaluate the admission checks for `cap` in their fixed order.
///
/// `flag_enabled` and `has_permission` are only invoked when evaluation
/// reaches their step.
pub fn admit<F, P>(
    cap: &Capability,
    license: Option<&License>,
    flag_enabled: F,
    has_permission: P,
) -> AdmissionDecision
where
    F: FnOnce(&str) -> bool,
    P: FnOnce(Permission) -> bool,
{
    let deny = |reason| AdmissionDecision { reason, permission: None };

    if !flag_enabled(cap.feature_flag) {
        return deny(AdmissionReason::FeatureDisabled);
    }
    let Some(license) = license else {
        return deny(AdmissionReason::NoLicense);
    };
    if !cap.skus.contains(&license.sku_short_name.as_str()) {
        return deny(AdmissionReason::WrongSku);
    }

    match cap.permission {
        Some(p) if !has_permission(p) => AdmissionDecision {
            reason: AdmissionReason::PermissionDenied,
            permission: Some(p),
        },
        permission => AdmissionDecision {
            reason: AdmissionReason::Allowed,
            permission,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::SKU_ENTERPRISE;

    const CAP: Capability = Capability {
        name: "test",
        feature_flag: "Flag",
        skus: &[SKU_ENTERPRISE],
        permission: Some(Permission::ReadIpFilters),
    };

    #[test]
    fn permission_not_consulted_after_entitlement_failure() {
        let d = admit(&CAP, None, |_| true, |_| unreachable!("permission checked"));
        assert_eq!(d.reason, AdmissionReason::NoLicense);
    }

    #[test]
    fn flag_is_looked_up_by_capability_key() {
        let lic = License::enterprise();
        let d = admit(&CAP, Some(&lic), |k| k == "Flag", |_| true);
        assert!(d.is_allowed());
    }

    #[test]
    fn permission_names_round_trip() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().ok(), Some(p));
        }
        assert!("nope".parse::<Permission>().is_err());
    }
}
