use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use evidentia_application::{PermissionCatalogRepository, PermissionGroupRepository};
use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::{
    GroupId, GroupMembership, PermissionCatalog, PermissionCode, PermissionGroup,
};
use tokio::sync::RwLock;

/// In-memory permission catalog, groups and the membership relation.
///
/// Membership is one ordered set of `(principal, group)` pairs, so both
/// directions are read from the same data and every insert is atomic.
#[derive(Debug)]
pub struct InMemoryPermissionRepository {
    catalog: RwLock<PermissionCatalog>,
    groups: RwLock<HashMap<GroupId, PermissionGroup>>,
    memberships: RwLock<BTreeSet<GroupMembership>>,
}

impl InMemoryPermissionRepository {
    /// Creates a repository over the given catalog with no groups.
    #[must_use]
    pub fn new(catalog: PermissionCatalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            groups: RwLock::new(HashMap::new()),
            memberships: RwLock::new(BTreeSet::new()),
        }
    }

    /// Replaces the catalog, e.g. after a permission was retired.
    pub async fn replace_catalog(&self, catalog: PermissionCatalog) {
        *self.catalog.write().await = catalog;
    }

    async fn update_group(
        &self,
        group_id: GroupId,
        apply: impl FnOnce(&mut PermissionGroup),
    ) -> AppResult<PermissionGroup> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(&group_id)
            .ok_or_else(|| AppError::not_found("group", group_id))?;
        apply(group);
        Ok(group.clone())
    }
}

impl Default for InMemoryPermissionRepository {
    fn default() -> Self {
        Self::new(PermissionCatalog::with_defaults())
    }
}

#[async_trait]
impl PermissionCatalogRepository for InMemoryPermissionRepository {
    async fn load_catalog(&self) -> AppResult<PermissionCatalog> {
        Ok(self.catalog.read().await.clone())
    }
}

#[async_trait]
impl PermissionGroupRepository for InMemoryPermissionRepository {
    async fn find_group(&self, group_id: GroupId) -> AppResult<Option<PermissionGroup>> {
        Ok(self.groups.read().await.get(&group_id).cloned())
    }

    async fn create_group(&self, group: PermissionGroup) -> AppResult<PermissionGroup> {
        let mut groups = self.groups.write().await;
        if groups.values().any(|stored| stored.code() == group.code()) {
            return Err(AppError::Conflict(format!(
                "permission group '{}' already exists",
                group.code()
            )));
        }

        groups.insert(group.id(), group.clone());
        Ok(group)
    }

    async fn delete_group(&self, group_id: GroupId) -> AppResult<()> {
        let mut groups = self.groups.write().await;
        let mut memberships = self.memberships.write().await;
        if groups.remove(&group_id).is_none() {
            return Err(AppError::not_found("group", group_id));
        }
        memberships.retain(|membership| membership.group_id != group_id);
        Ok(())
    }

    async fn add_group_permissions(
        &self,
        group_id: GroupId,
        codes: Vec<PermissionCode>,
    ) -> AppResult<PermissionGroup> {
        self.update_group(group_id, |group| {
            group.add_permissions(codes);
        })
        .await
    }

    async fn remove_group_permissions(
        &self,
        group_id: GroupId,
        codes: Vec<PermissionCode>,
    ) -> AppResult<PermissionGroup> {
        self.update_group(group_id, |group| {
            group.remove_permissions(&codes);
        })
        .await
    }

    async fn set_group_active(
        &self,
        group_id: GroupId,
        active: bool,
    ) -> AppResult<PermissionGroup> {
        self.update_group(group_id, |group| group.set_active(active))
            .await
    }

    async fn add_member(&self, membership: GroupMembership) -> AppResult<bool> {
        let groups = self.groups.read().await;
        if !groups.contains_key(&membership.group_id) {
            return Err(AppError::not_found("group", membership.group_id));
        }

        Ok(self.memberships.write().await.insert(membership))
    }

    async fn remove_member(&self, membership: GroupMembership) -> AppResult<bool> {
        Ok(self.memberships.write().await.remove(&membership))
    }

    async fn list_groups_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionGroup>> {
        let groups = self.groups.read().await;
        let memberships = self.memberships.read().await;

        let mut listed: Vec<PermissionGroup> = memberships
            .iter()
            .filter(|membership| membership.principal_id == principal_id)
            .filter_map(|membership| groups.get(&membership.group_id).cloned())
            .collect();
        listed.sort_by(|left, right| right.priority().cmp(&left.priority()));
        Ok(listed)
    }

    async fn list_members(&self, group_id: GroupId) -> AppResult<Vec<PrincipalId>> {
        Ok(self
            .memberships
            .read()
            .await
            .iter()
            .filter(|membership| membership.group_id == group_id)
            .map(|membership| membership.principal_id)
            .collect())
    }
}
