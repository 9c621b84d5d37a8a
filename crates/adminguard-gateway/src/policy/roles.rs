//! Role grant compilation and matching.
//!
//! Roles map to permission names; `"*"` grants every permission.

use std::collections::{BTreeMap, HashMap, HashSet};

use adminguard_core::capability::Permission;
use adminguard_core::error::{AdminGuardError, Result};
use adminguard_core::principal::Principal;

use crate::providers::PermissionProvider;

/// Compiled grant for one role.
#[derive(Debug, Clone)]
pub struct RoleGrant {
    pub permissions: Option<HashSet<Permission>>, // None => wildcard
}

pub fn compile_role_grants(raw: &BTreeMap<String, Vec<String>>) -> Result<HashMap<String, RoleGrant>> {
    let mut out = HashMap::with_capacity(raw.len());
    for (role, perms) in raw {
        let grant = if perms.iter().any(|p| p == "*") {
            RoleGrant { permissions: None }
        } else {
            let set = perms
                .iter()
                .map(|p| {
                    p.parse::<Permission>().map_err(|_| {
                        AdminGuardError::BadRequest(format!("role {role}: unknown permission {p}"))
                    })
                })
                .collect::<Result<HashSet<_>>>()?;
            RoleGrant { permissions: Some(set) }
        };
        out.insert(role.clone(), grant);
    }
    Ok(out)
}

pub fn is_granted(grants: &HashMap<String, RoleGrant>, roles: &[String], permission: Permission) -> bool {
    roles.iter().any(|r| match grants.get(r) {
        None => false,
        Some(RoleGrant { permissions: None }) => true,
        Some(RoleGrant { permissions: Some(set) }) => set.contains(&permission),
    })
}

/// Role-based permission provider built once at startup.
#[derive(Debug, Default)]
pub struct RolePermissions {
    grants: HashMap<String, RoleGrant>,
}

impl RolePermissions {
    pub fn new(raw: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        Ok(Self {
            grants: compile_role_grants(raw)?,
        })
    }
}

impl PermissionProvider for RolePermissions {
    fn has_permission(&self, principal: &Principal, permission: Permission) -> bool {
        is_granted(&self.grants, &principal.roles, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            ("system_admin".to_string(), vec!["*".to_string()]),
            (
                "read_only".to_string(),
                vec!["sysconsole_read_ip_filters".to_string()],
            ),
        ])
    }

    #[test]
    fn wildcard_and_explicit_grants() {
        let grants = compile_role_grants(&raw()).unwrap();
        let admin = vec!["system_admin".to_string()];
        let ro = vec!["read_only".to_string()];
        assert!(is_granted(&grants, &admin, Permission::WriteIpFilters));
        assert!(is_granted(&grants, &ro, Permission::ReadIpFilters));
        assert!(!is_granted(&grants, &ro, Permission::WriteIpFilters));
        assert!(!is_granted(&grants, &["ghost".to_string()], Permission::ReadIpFilters));
        assert!(!is_granted(&grants, &[], Permission::ReadIpFilters));
    }

    #[test]
    fn unknown_permission_fails_compilation() {
        let bad = BTreeMap::from([("r".to_string(), vec!["root".to_string()])]);
        assert!(compile_role_grants(&bad).is_err());
    }
}
