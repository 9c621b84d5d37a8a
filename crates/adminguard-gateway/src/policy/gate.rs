use std::sync::Arc;

use adminguard_core::capability::{admit, AdmissionDecision, Capability};
use adminguard_core::license::License;
use adminguard_core::principal::Principal;

use crate::obs::metrics::GatewayMetrics;
use crate::providers::{FeatureFlagProvider, LicenseProvider, PermissionProvider};

/// Decision plus the license snapshot it was computed from.
#[derive(Debug, Clone)]
pub struct Admission {
    pub decision: AdmissionDecision,
    pub license: Option<License>,
}

/// Composed entitlement + toggle + permission check.
/// Construct once at startup, then share by cloning.
#[derive(Clone)]
pub struct Gate {
    license: Arc<dyn LicenseProvider>,
    flags: Arc<dyn FeatureFlagProvider>,
    permissions: Arc<dyn PermissionProvider>,
    metrics: Arc<GatewayMetrics>,
}

impl Gate {
    pub fn new(
        license: Arc<dyn LicenseProvider>,
        flags: Arc<dyn FeatureFlagProvider>,
        permissions: Arc<dyn PermissionProvider>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            license,
            flags,
            permissions,
            metrics,
        }
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Evaluate `cap` for `principal` against current provider state.
    pub fn admit(&self, cap: &Capability, principal: &Principal) -> Admission {
        let license = self.license.current_license();
        let decision = admit(
            cap,
            license.as_ref(),
            |flag| self.flags.is_enabled(flag),
            |perm| self.permissions.has_permission(principal, perm),
        );

        self.metrics
            .admission_decisions
            .inc(&[("action", cap.name), ("reason", decision.reason.as_str())]);
        tracing::debug!(
            action = cap.name,
            user = principal.user_id(),
            reason = decision.reason.as_str(),
            "admission evaluated"
        );

        Admission { decision, license }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::policy::RolePermissions;
    use crate::providers::{MemoryFeatureFlags, StaticLicense};
    use adminguard_core::capability::{AdmissionReason, Permission};
    use adminguard_core::license::SKU_ENTERPRISE;

    const CAP: Capability = Capability {
        name: "applyIPFilters",
        feature_flag: "CloudIPFiltering",
        skus: &[SKU_ENTERPRISE],
        permission: Some(Permission::WriteIpFilters),
    };

    fn gate(license: Option<License>) -> (Gate, Arc<MemoryFeatureFlags>) {
        let flags = Arc::new(MemoryFeatureFlags::default());
        flags.set("CloudIPFiltering", true);
        let mut roles = BTreeMap::new();
        roles.insert("admin".to_string(), vec!["*".to_string()]);
        let gate = Gate::new(
            Arc::new(StaticLicense::new(license)),
            flags.clone(),
            Arc::new(RolePermissions::new(&roles).unwrap()),
            Arc::new(GatewayMetrics::default()),
        );
        (gate, flags)
    }

    #[test]
    fn decisions_follow_provider_state_and_are_counted() {
        let admin = Principal::new("u1", vec!["admin".into()]);
        let nobody = Principal::new("u2", vec![]);
        let (g, flags) = gate(Some(License::enterprise()));

        let a = g.admit(&CAP, &admin);
        assert!(a.decision.is_allowed());
        assert_eq!(a.license, Some(License::enterprise()));
        assert_eq!(g.admit(&CAP, &nobody).decision.reason, AdmissionReason::PermissionDenied);

        flags.set("CloudIPFiltering", false);
        assert_eq!(g.admit(&CAP, &admin).decision.reason, AdmissionReason::FeatureDisabled);

        let counted = |reason| {
            g.metrics()
                .admission_decisions
                .get(&[("action", "applyIPFilters"), ("reason", reason)])
        };
        assert_eq!(counted("allowed"), 1);
        assert_eq!(counted("permission_denied"), 1);
        assert_eq!(counted("feature_disabled"), 1);
    }

    #[test]
    fn missing_license_is_reported_before_permission() {
        let nobody = Principal::new("u2", vec![]);
        let (g, _) = gate(None);
        assert_eq!(g.admit(&CAP, &nobody).decision.reason, AdmissionReason::NoLicense);
    }
}
