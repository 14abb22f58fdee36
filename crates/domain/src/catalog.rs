//! Immutable-per-request lookup of permission definitions.

use std::collections::BTreeMap;

use evidentia_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{Permission, PermissionAction, PermissionCode, PermissionLevel, PermissionModule};

/// Permission definitions keyed by normalized code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCatalog {
    permissions: BTreeMap<PermissionCode, Permission>,
}

impl PermissionCatalog {
    /// Builds a catalog, rejecting duplicate codes.
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> AppResult<Self> {
        let mut by_code = BTreeMap::new();
        for permission in permissions {
            let code = permission.code().clone();
            if by_code.insert(code.clone(), permission).is_some() {
                return Err(AppError::validation(
                    "code",
                    format!("permission code '{code}' is defined more than once"),
                ));
            }
        }

        Ok(Self {
            permissions: by_code,
        })
    }

    /// Returns the seeded default catalog.
    #[must_use]
    pub fn with_defaults() -> Self {
        use PermissionAction as A;
        use PermissionLevel as L;
        use PermissionModule as M;

        let seeds: &[(M, A, &str, L)] = &[
            (M::Reports, A::Create, "Create self-evaluation reports", L::Intermediate),
            (M::Reports, A::Read, "View self-evaluation reports", L::Basic),
            (M::Reports, A::Update, "Update self-evaluation reports", L::Intermediate),
            (M::Reports, A::Delete, "Delete self-evaluation reports", L::Advanced),
            (M::Reports, A::Approve, "Approve reports", L::Advanced),
            (M::Reports, A::Export, "Export reports", L::Basic),
            (M::Evaluations, A::Create, "Create evaluations", L::Intermediate),
            (M::Evaluations, A::Read, "View evaluations", L::Basic),
            (M::Evaluations, A::Update, "Update evaluations", L::Intermediate),
            (M::Evaluations, A::Delete, "Delete evaluations", L::Advanced),
            (M::Evaluations, A::Approve, "Approve evaluations", L::Advanced),
            (M::Users, A::Create, "Create users", L::Advanced),
            (M::Users, A::Read, "View users", L::Basic),
            (M::Users, A::Update, "Update users", L::Advanced),
            (M::Users, A::Delete, "Delete users", L::Critical),
            (M::Users, A::Manage, "Manage all users", L::Critical),
            (M::Standards, A::Create, "Create standards", L::Advanced),
            (M::Standards, A::Read, "View standards", L::Basic),
            (M::Standards, A::Update, "Update standards", L::Advanced),
            (M::Standards, A::Delete, "Delete standards", L::Critical),
            (M::Criteria, A::Create, "Create criteria", L::Advanced),
            (M::Criteria, A::Read, "View criteria", L::Basic),
            (M::Criteria, A::Update, "Update criteria", L::Advanced),
            (M::Criteria, A::Delete, "Delete criteria", L::Critical),
            (M::Programs, A::Create, "Create programs", L::Advanced),
            (M::Programs, A::Read, "View programs", L::Basic),
            (M::Programs, A::Update, "Update programs", L::Advanced),
            (M::Programs, A::Delete, "Delete programs", L::Critical),
            (M::Evidences, A::Read, "View evidence items", L::Basic),
            (M::Evidences, A::Assign, "Assign evidence contributors", L::Advanced),
            (M::Evidences, A::Upload, "Upload evidence files", L::Intermediate),
            (M::Evidences, A::Approve, "Approve or reject evidence files", L::Advanced),
            (M::System, A::Manage, "Administer the system", L::Critical),
            (M::Settings, A::Update, "Update settings", L::Advanced),
        ];

        Self {
            permissions: seeds
                .iter()
                .map(|(module, action, name, level)| {
                    let permission = Permission::new(*module, *action, *name, *level);
                    (permission.code().clone(), permission)
                })
                .collect(),
        }
    }

    /// Looks up a permission by code, case-insensitively, regardless of its active flag.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Permission> {
        let code = PermissionCode::new(code).ok()?;
        self.permissions.get(&code)
    }

    /// Looks up a permission that is allowed to contribute to resolution.
    #[must_use]
    pub fn active(&self, code: &PermissionCode) -> Option<&Permission> {
        self.permissions
            .get(code)
            .filter(|permission| permission.is_active())
    }

    /// Iterates all definitions in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values()
    }

    /// Lists the definitions of one module.
    #[must_use]
    pub fn by_module(&self, module: PermissionModule) -> Vec<&Permission> {
        self.iter()
            .filter(|permission| permission.module() == module)
            .collect()
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::PermissionCatalog;
    use crate::{Permission, PermissionAction, PermissionLevel, PermissionModule, codes};

    #[test]
    fn defaults_include_workflow_guard_codes() {
        let catalog = PermissionCatalog::with_defaults();
        for code in [
            codes::EVIDENCES_ASSIGN,
            codes::EVIDENCES_UPLOAD,
            codes::EVIDENCES_APPROVE,
            codes::USERS_MANAGE,
            codes::SYSTEM_MANAGE,
        ] {
            assert!(catalog.get(code).is_some(), "missing {code}");
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = PermissionCatalog::with_defaults();
        assert!(catalog.get("reports.create").is_some());
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let permission = Permission::new(
            PermissionModule::Reports,
            PermissionAction::Read,
            "View reports",
            PermissionLevel::Basic,
        );
        assert!(PermissionCatalog::new([permission.clone(), permission]).is_err());
    }

    #[test]
    fn retired_permissions_are_not_active() {
        let mut permission = Permission::new(
            PermissionModule::Reports,
            PermissionAction::Read,
            "View reports",
            PermissionLevel::Basic,
        );
        permission.set_active(false);
        let code = permission.code().clone();
        let catalog = PermissionCatalog::new([permission]);

        assert!(catalog.is_ok_and(|catalog| {
            catalog.get("REPORTS.READ").is_some() && catalog.active(&code).is_none()
        }));
    }
}
