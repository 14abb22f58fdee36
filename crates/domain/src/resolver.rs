//! Effective permission computation.
//!
//! Resolution is a pure function over a fully loaded [`PrincipalSnapshot`].
//! Sources are merged in a fixed order: active groups, then selected
//! permissions, then overrides. A denied override always wins.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    OverrideKind, Permission, PermissionAction, PermissionCatalog, PermissionCode,
    PermissionGroup, PermissionModule, Principal, Role,
};

/// Coarse capability derived from the principal's primary role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCapability {
    /// Primary role is admin.
    Admin,
    /// Primary role is admin or manager.
    ManagerOrAbove,
}

impl RoleCapability {
    /// Returns a stable display value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "role:admin",
            Self::ManagerOrAbove => "role:manager_or_above",
        }
    }

    fn for_role(role: Role) -> BTreeSet<Self> {
        match role {
            Role::Admin => BTreeSet::from([Self::Admin, Self::ManagerOrAbove]),
            Role::Manager => BTreeSet::from([Self::ManagerOrAbove]),
            Role::Expert | Role::Advisor => BTreeSet::new(),
        }
    }
}

/// Everything resolution needs, loaded upfront.
#[derive(Debug, Clone)]
pub struct PrincipalSnapshot {
    /// Principal with selected permissions and overrides populated.
    pub principal: Principal,
    /// Groups the principal is a member of, active or not.
    pub groups: Vec<PermissionGroup>,
    /// Catalog used to filter retired and unknown permissions.
    pub catalog: PermissionCatalog,
}

/// De-duplicated permissions a principal holds after all sources are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    permissions: BTreeMap<PermissionCode, Permission>,
    capabilities: BTreeSet<RoleCapability>,
}

impl EffectivePermissions {
    /// Returns whether `code` is held. Comparison is case-insensitive.
    #[must_use]
    pub fn has_permission(&self, code: &str) -> bool {
        PermissionCode::new(code).is_ok_and(|code| self.contains(&code))
    }

    /// Returns whether a normalized code is held.
    #[must_use]
    pub fn contains(&self, code: &PermissionCode) -> bool {
        self.permissions.contains_key(code)
    }

    /// Returns whether every code is held. True for an empty list.
    #[must_use]
    pub fn has_all_permissions<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        codes.iter().all(|code| self.has_permission(code.as_ref()))
    }

    /// Returns whether at least one code is held. False for an empty list.
    #[must_use]
    pub fn has_any_permission<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        codes.iter().any(|code| self.has_permission(code.as_ref()))
    }

    /// Returns whether some held permission belongs to `module`, optionally with `action`.
    #[must_use]
    pub fn has_module_permission(
        &self,
        module: PermissionModule,
        action: Option<PermissionAction>,
    ) -> bool {
        self.permissions.values().any(|permission| {
            permission.module() == module
                && action.is_none_or(|action| permission.action() == action)
        })
    }

    /// Returns whether the primary role grants a legacy capability.
    #[must_use]
    pub fn has_capability(&self, capability: RoleCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Iterates held permissions in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values()
    }

    /// Iterates held codes in order.
    pub fn codes(&self) -> impl Iterator<Item = &PermissionCode> {
        self.permissions.keys()
    }

    /// Returns the number of held permissions. Role capabilities are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Returns whether no permission is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

/// Computes effective permission sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    /// Resolves the effective set for one snapshot.
    ///
    /// Inactive groups, retired permissions and codes missing from the catalog
    /// are skipped silently. Missing data yields an empty set.
    #[must_use]
    pub fn resolve(snapshot: &PrincipalSnapshot) -> EffectivePermissions {
        let catalog = &snapshot.catalog;
        let mut permissions: BTreeMap<PermissionCode, Permission> = BTreeMap::new();

        let group_codes = snapshot
            .groups
            .iter()
            .filter(|group| group.is_active())
            .flat_map(|group| group.permissions().iter());
        let selected_codes = snapshot.principal.selected_permissions().iter();

        for code in group_codes.chain(selected_codes) {
            if let Some(permission) = catalog.active(code) {
                permissions
                    .entry(code.clone())
                    .or_insert_with(|| permission.clone());
            }
        }

        for entry in snapshot.principal.overrides() {
            match entry.kind {
                OverrideKind::Granted => {
                    if let Some(permission) = catalog.active(&entry.permission) {
                        permissions.insert(entry.permission.clone(), permission.clone());
                    }
                }
                OverrideKind::Denied => {
                    permissions.remove(&entry.permission);
                }
            }
        }

        EffectivePermissions {
            permissions,
            capabilities: RoleCapability::for_role(snapshot.principal.roles().primary()),
        }
    }
}
