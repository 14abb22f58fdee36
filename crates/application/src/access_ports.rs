use async_trait::async_trait;

use evidentia_core::{AppResult, PrincipalId};
use evidentia_domain::{
    GroupId, GroupMembership, PermissionCatalog, PermissionCode, PermissionGroup, Principal,
};

/// Repository port for principals and their individual permission sources.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds a principal with selected permissions and overrides populated.
    async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>>;

    /// Saves a principal loaded at `principal.version()`.
    ///
    /// Returns the stored principal with its new version, or
    /// `AppError::Conflict` when another writer saved first.
    async fn save_principal(&self, principal: Principal) -> AppResult<Principal>;
}

/// Repository port for the permission catalog.
#[async_trait]
pub trait PermissionCatalogRepository: Send + Sync {
    /// Loads every permission definition, active or retired.
    async fn load_catalog(&self) -> AppResult<PermissionCatalog>;
}

/// Repository port for permission groups and the membership relation.
///
/// Membership is stored once as `(principal, group)` pairs. Every mutation
/// of a set-valued field is a single atomic operation of the adapter.
#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    /// Finds one group.
    async fn find_group(&self, group_id: GroupId) -> AppResult<Option<PermissionGroup>>;

    /// Stores a new group. Fails with `AppError::Conflict` on a duplicate code.
    async fn create_group(&self, group: PermissionGroup) -> AppResult<PermissionGroup>;

    /// Deletes a group and all of its memberships.
    async fn delete_group(&self, group_id: GroupId) -> AppResult<()>;

    /// Adds permissions to a group in one atomic union.
    async fn add_group_permissions(
        &self,
        group_id: GroupId,
        codes: Vec<PermissionCode>,
    ) -> AppResult<PermissionGroup>;

    /// Removes permissions from a group in one atomic step.
    async fn remove_group_permissions(
        &self,
        group_id: GroupId,
        codes: Vec<PermissionCode>,
    ) -> AppResult<PermissionGroup>;

    /// Activates or deactivates a group.
    async fn set_group_active(&self, group_id: GroupId, active: bool)
    -> AppResult<PermissionGroup>;

    /// Inserts a membership unless present. Returns whether it was new.
    async fn add_member(&self, membership: GroupMembership) -> AppResult<bool>;

    /// Removes a membership. Returns whether it existed.
    async fn remove_member(&self, membership: GroupMembership) -> AppResult<bool>;

    /// Lists groups a principal belongs to, including inactive ones.
    async fn list_groups_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionGroup>>;

    /// Lists members of a group.
    async fn list_members(&self, group_id: GroupId) -> AppResult<Vec<PrincipalId>>;
}
