use std::collections::BTreeSet;

use evidentia_core::{AppError, AppResult, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::{
    GroupId, Permission, PermissionAction, PermissionCatalog, PermissionCode, PermissionLevel,
    PermissionModule,
};

/// Highest accepted group priority.
pub const GROUP_PRIORITY_MAX: u8 = 100;

/// Whether a group is managed by the system or by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Seeded group that cannot be deleted.
    System,
    /// Administrator-defined group.
    Custom,
}

impl GroupKind {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Custom => "custom",
        }
    }
}

/// A named bundle of permissions.
///
/// Priority orders groups for display only. It never breaks ties during
/// resolution because permissions, not group attributes, are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    id: GroupId,
    code: String,
    name: String,
    kind: GroupKind,
    priority: u8,
    active: bool,
    permissions: BTreeSet<PermissionCode>,
}

impl PermissionGroup {
    /// Creates an active custom group with no permissions.
    pub fn new(code: &str, name: &str, priority: u8) -> AppResult<Self> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(AppError::validation("code", "group code must not be empty"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "group name must not be empty"));
        }
        if priority > GROUP_PRIORITY_MAX {
            return Err(AppError::validation(
                "priority",
                format!("priority must be between 0 and {GROUP_PRIORITY_MAX}"),
            ));
        }

        Ok(Self {
            id: GroupId::new(),
            code,
            name: name.to_owned(),
            kind: GroupKind::Custom,
            priority,
            active: true,
            permissions: BTreeSet::new(),
        })
    }

    fn system(code: &str, name: &str, priority: u8, permissions: BTreeSet<PermissionCode>) -> Self {
        Self {
            id: GroupId::new(),
            code: code.to_owned(),
            name: name.to_owned(),
            kind: GroupKind::System,
            priority,
            active: true,
            permissions,
        }
    }

    /// Returns the group identifier.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Returns the upper-cased unique group code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the group kind.
    #[must_use]
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Returns the display priority.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Returns whether the group contributes to resolution.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the bundled permission codes.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<PermissionCode> {
        &self.permissions
    }

    /// Activates or deactivates the group.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Adds permissions, returning how many were new.
    pub fn add_permissions(&mut self, codes: impl IntoIterator<Item = PermissionCode>) -> usize {
        codes
            .into_iter()
            .filter(|code| self.permissions.insert(code.clone()))
            .count()
    }

    /// Removes permissions, returning how many were present.
    pub fn remove_permissions<'a>(
        &mut self,
        codes: impl IntoIterator<Item = &'a PermissionCode>,
    ) -> usize {
        codes
            .into_iter()
            .filter(|code| self.permissions.remove(*code))
            .count()
    }

    /// Ensures the group may be deleted by administrators.
    pub fn ensure_deletable(&self) -> AppResult<()> {
        if self.kind == GroupKind::System {
            return Err(AppError::validation(
                "group_id",
                format!("system group '{}' cannot be deleted", self.code),
            ));
        }

        Ok(())
    }
}

/// One edge of the principal/group membership relation.
///
/// The relation is stored once; both "groups of a principal" and
/// "members of a group" are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupMembership {
    /// Member principal.
    pub principal_id: PrincipalId,
    /// Group the principal belongs to.
    pub group_id: GroupId,
}

/// Builds the seeded system groups from a catalog.
#[must_use]
pub fn default_groups(catalog: &PermissionCatalog) -> Vec<PermissionGroup> {
    let active: Vec<&Permission> = catalog
        .iter()
        .filter(|permission| permission.is_active())
        .collect();
    let select = |predicate: fn(&Permission) -> bool| -> BTreeSet<PermissionCode> {
        active
            .iter()
            .copied()
            .filter(|permission| predicate(*permission))
            .map(|permission| permission.code().clone())
            .collect()
    };

    let all = select(|_| true);
    let manager = select(|permission| {
        permission.level() != PermissionLevel::Critical
            || permission.module() == PermissionModule::Reports
    });
    let expert = select(|permission| {
        let authoring = matches!(
            permission.action(),
            PermissionAction::Read | PermissionAction::Create | PermissionAction::Update
        ) && !matches!(
            permission.module(),
            PermissionModule::Users | PermissionModule::System | PermissionModule::Settings
        );
        authoring
            || (permission.module() == PermissionModule::Evidences
                && permission.action() == PermissionAction::Upload)
    });
    let read_only = select(|permission| permission.action() == PermissionAction::Read);

    vec![
        PermissionGroup::system("SUPER_ADMIN", "System administrators", 100, all),
        PermissionGroup::system("REPORT_MANAGER", "Report managers", 80, manager),
        PermissionGroup::system("EVALUATION_EXPERT", "Evaluation experts", 60, expert),
        PermissionGroup::system("ADVISOR", "Advisors", 40, read_only.clone()),
        PermissionGroup::system("VIEWER", "Viewers", 20, read_only),
    ]
}
