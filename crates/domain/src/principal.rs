//! Principal domain types: roles, account status and individual overrides.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use evidentia_core::{AppError, AppResult, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::{DepartmentId, PermissionCode};

/// Coarse legacy role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System administrator.
    Admin,
    /// Department manager.
    Manager,
    /// Evaluation expert and evidence contributor.
    Expert,
    /// Read-only advisor.
    Advisor,
}

impl Role {
    /// Role given to principals whose role list is unset.
    pub const LEAST_PRIVILEGED: Self = Self::Expert;

    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Expert => "expert",
            Self::Advisor => "advisor",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "expert" => Ok(Self::Expert),
            "advisor" => Ok(Self::Advisor),
            _ => Err(AppError::validation(
                "roles",
                format!("unknown role '{value}'"),
            )),
        }
    }
}

/// Ordered, never-empty role list whose first element is the primary role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Role>")]
pub struct Roles(Vec<Role>);

impl From<Vec<Role>> for Roles {
    fn from(roles: Vec<Role>) -> Self {
        Self::new(roles)
    }
}

impl Roles {
    /// Builds a role list, dropping duplicates and defaulting when empty.
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut ordered = Vec::new();
        for role in roles {
            if !ordered.contains(&role) {
                ordered.push(role);
            }
        }
        if ordered.is_empty() {
            ordered.push(Role::LEAST_PRIVILEGED);
        }

        Self(ordered)
    }

    /// Returns the primary role.
    #[must_use]
    pub fn primary(&self) -> Role {
        self.0.first().copied().unwrap_or(Role::LEAST_PRIVILEGED)
    }

    /// Returns whether the list contains `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Returns whether any of `roles` is held.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Returns whether all of `roles` are held.
    #[must_use]
    pub fn has_all_roles(&self, roles: &[Role]) -> bool {
        roles.iter().all(|role| self.has_role(*role))
    }

    /// Appends a role when it is not already held.
    pub fn add(&mut self, role: Role) {
        if !self.has_role(role) {
            self.0.push(role);
        }
    }

    /// Removes a role. Removing the last role restores the default.
    pub fn remove(&mut self, role: Role) {
        self.0.retain(|held| *held != role);
        if self.0.is_empty() {
            self.0.push(Role::LEAST_PRIVILEGED);
        }
    }

    /// Iterates roles in order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl Default for Roles {
    fn default() -> Self {
        Self::new([])
    }
}

/// Account state of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalStatus {
    /// May authenticate.
    Active,
    /// Disabled by an administrator.
    Inactive,
    /// Temporarily locked.
    Suspended,
    /// Awaiting activation.
    Pending,
}

/// Direction of an individual override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    /// Grants the permission regardless of group membership.
    Granted,
    /// Removes the permission regardless of how it was obtained.
    Denied,
}

impl OverrideKind {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl FromStr for OverrideKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            _ => Err(AppError::validation(
                "kind",
                format!("unknown override kind '{value}'"),
            )),
        }
    }
}

/// An individual grant or deny for one permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    /// Overridden permission.
    pub permission: PermissionCode,
    /// Grant or deny.
    pub kind: OverrideKind,
    /// Administrator who recorded the override.
    pub granted_by: PrincipalId,
    /// When the override was recorded.
    pub granted_at: DateTime<Utc>,
}

/// An authenticated actor and its individually assigned permission sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
    display_name: String,
    roles: Roles,
    status: PrincipalStatus,
    department: Option<DepartmentId>,
    selected_permissions: BTreeSet<PermissionCode>,
    overrides: BTreeMap<PermissionCode, PermissionOverride>,
    version: u64,
}

impl Principal {
    /// Creates an active principal without individual permissions.
    pub fn new(id: PrincipalId, display_name: &str, roles: Roles) -> AppResult<Self> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::validation(
                "display_name",
                "display name must not be empty",
            ));
        }

        Ok(Self {
            id,
            display_name: display_name.to_owned(),
            roles,
            status: PrincipalStatus::Active,
            department: None,
            selected_permissions: BTreeSet::new(),
            overrides: BTreeMap::new(),
            version: 0,
        })
    }

    /// Places the principal in a department.
    #[must_use]
    pub fn with_department(mut self, department: DepartmentId) -> Self {
        self.department = Some(department);
        self
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn id(&self) -> PrincipalId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the role list.
    #[must_use]
    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// Returns the mutable role list.
    pub fn roles_mut(&mut self) -> &mut Roles {
        &mut self.roles
    }

    /// Returns the account status.
    #[must_use]
    pub fn status(&self) -> PrincipalStatus {
        self.status
    }

    /// Returns whether the principal may act at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PrincipalStatus::Active
    }

    /// Updates the account status.
    pub fn set_status(&mut self, status: PrincipalStatus) {
        self.status = status;
    }

    /// Returns the department, when assigned.
    #[must_use]
    pub fn department(&self) -> Option<DepartmentId> {
        self.department
    }

    /// Returns the individually selected permission codes.
    #[must_use]
    pub fn selected_permissions(&self) -> &BTreeSet<PermissionCode> {
        &self.selected_permissions
    }

    /// Replaces the individually selected permission codes.
    pub fn set_selected_permissions(&mut self, codes: impl IntoIterator<Item = PermissionCode>) {
        self.selected_permissions = codes.into_iter().collect();
    }

    /// Iterates overrides, at most one per permission.
    pub fn overrides(&self) -> impl Iterator<Item = &PermissionOverride> {
        self.overrides.values()
    }

    /// Returns the override recorded for one permission.
    #[must_use]
    pub fn override_for(&self, code: &PermissionCode) -> Option<&PermissionOverride> {
        self.overrides.get(code)
    }

    /// Records an override, replacing and returning any prior one for the same permission.
    pub fn set_override(&mut self, entry: PermissionOverride) -> Option<PermissionOverride> {
        self.overrides.insert(entry.permission.clone(), entry)
    }

    /// Removes the override for one permission.
    pub fn clear_override(&mut self, code: &PermissionCode) -> Option<PermissionOverride> {
        self.overrides.remove(code)
    }

    /// Returns the persisted document version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the document version. Reserved for persistence adapters.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
