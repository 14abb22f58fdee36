use std::sync::Arc;

use chrono::Utc;
use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::{
    AccessRequirement, AuditAction, GroupId, GroupMembership, OverrideKind, PermissionCode,
    PermissionGroup, PermissionOverride, Principal, codes,
};
use tracing::{info, warn};

use crate::{
    AccessGuard, AuditEvent, AuditRepository, AuthorizedPrincipal, PermissionCatalogRepository,
    PermissionGroupRepository, PrincipalRepository, WriteRetryPolicy, retry_on_conflict,
};

/// Input payload for creating a custom permission group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupInput {
    /// Unique group code, upper-cased on save.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Display priority between 0 and 100.
    pub priority: u8,
    /// Initial permission codes.
    pub permissions: Vec<String>,
}

/// Input payload for changing a group's permissions and active flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateGroupInput {
    /// Codes to add.
    pub add: Vec<String>,
    /// Codes to remove.
    pub remove: Vec<String>,
    /// New active flag, when changing it.
    pub active: Option<bool>,
}

/// Administration of groups, memberships and individual permissions.
#[derive(Clone)]
pub struct PermissionAdminService {
    guard: AccessGuard,
    principals: Arc<dyn PrincipalRepository>,
    groups: Arc<dyn PermissionGroupRepository>,
    catalog: Arc<dyn PermissionCatalogRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    retry_policy: WriteRetryPolicy,
}

impl PermissionAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        guard: AccessGuard,
        principals: Arc<dyn PrincipalRepository>,
        groups: Arc<dyn PermissionGroupRepository>,
        catalog: Arc<dyn PermissionCatalogRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        retry_policy: WriteRetryPolicy,
    ) -> Self {
        Self {
            guard,
            principals,
            groups,
            catalog,
            audit_repository,
            retry_policy,
        }
    }

    /// Creates a custom group with an initial permission set.
    pub async fn create_group(
        &self,
        actor: Option<PrincipalId>,
        input: CreateGroupInput,
    ) -> AppResult<PermissionGroup> {
        let authorized = self.require_admin(actor).await?;
        let permissions = self.known_codes(&input.permissions).await?;

        let mut group = PermissionGroup::new(&input.code, &input.name, input.priority)?;
        group.add_permissions(permissions);
        let group = self.groups.create_group(group).await?;

        self.append_event(
            &authorized,
            AuditAction::SecurityGroupCreated,
            "permission_group",
            group.id().to_string(),
            format!("created group '{}'", group.code()),
        )
        .await;

        Ok(group)
    }

    /// Adds and removes permissions and optionally toggles the active flag.
    pub async fn update_group(
        &self,
        actor: Option<PrincipalId>,
        group_id: GroupId,
        input: UpdateGroupInput,
    ) -> AppResult<PermissionGroup> {
        let authorized = self.require_admin(actor).await?;
        let add = self.known_codes(&input.add).await?;
        let remove = input
            .remove
            .iter()
            .map(PermissionCode::new)
            .collect::<AppResult<Vec<_>>>()?;

        let mut group = self.require_group(group_id).await?;
        if !add.is_empty() {
            group = self.groups.add_group_permissions(group_id, add).await?;
        }
        if !remove.is_empty() {
            group = self.groups.remove_group_permissions(group_id, remove).await?;
        }
        if let Some(active) = input.active {
            group = self.groups.set_group_active(group_id, active).await?;
        }

        self.append_event(
            &authorized,
            AuditAction::SecurityGroupUpdated,
            "permission_group",
            group_id.to_string(),
            format!(
                "group '{}' now has {} permission(s), active={}",
                group.code(),
                group.permissions().len(),
                group.is_active()
            ),
        )
        .await;

        Ok(group)
    }

    /// Deletes a custom group. System groups cannot be deleted.
    pub async fn delete_group(
        &self,
        actor: Option<PrincipalId>,
        group_id: GroupId,
    ) -> AppResult<()> {
        let authorized = self.require_admin(actor).await?;
        let group = self.require_group(group_id).await?;
        group.ensure_deletable()?;
        self.groups.delete_group(group_id).await?;

        self.append_event(
            &authorized,
            AuditAction::SecurityGroupDeleted,
            "permission_group",
            group_id.to_string(),
            format!("deleted group '{}'", group.code()),
        )
        .await;

        Ok(())
    }

    /// Adds a principal to a group. Adding an existing member is a no-op.
    pub async fn add_member(
        &self,
        actor: Option<PrincipalId>,
        group_id: GroupId,
        principal_id: PrincipalId,
    ) -> AppResult<()> {
        let authorized = self.require_admin(actor).await?;
        self.require_group(group_id).await?;
        self.require_principal(principal_id).await?;

        let added = self
            .groups
            .add_member(GroupMembership {
                principal_id,
                group_id,
            })
            .await?;
        if !added {
            return Ok(());
        }

        self.append_event(
            &authorized,
            AuditAction::SecurityGroupMemberAdded,
            "permission_group_member",
            format!("{group_id}:{principal_id}"),
            format!("added '{principal_id}' to group '{group_id}'"),
        )
        .await;

        Ok(())
    }

    /// Removes a principal from a group. Removing a non-member is a no-op.
    pub async fn remove_member(
        &self,
        actor: Option<PrincipalId>,
        group_id: GroupId,
        principal_id: PrincipalId,
    ) -> AppResult<()> {
        let authorized = self.require_admin(actor).await?;
        let removed = self
            .groups
            .remove_member(GroupMembership {
                principal_id,
                group_id,
            })
            .await?;
        if !removed {
            return Ok(());
        }

        self.append_event(
            &authorized,
            AuditAction::SecurityGroupMemberRemoved,
            "permission_group_member",
            format!("{group_id}:{principal_id}"),
            format!("removed '{principal_id}' from group '{group_id}'"),
        )
        .await;

        Ok(())
    }

    /// Lists the members of a group.
    pub async fn list_members(
        &self,
        actor: Option<PrincipalId>,
        group_id: GroupId,
    ) -> AppResult<Vec<PrincipalId>> {
        self.require_admin(actor).await?;
        self.require_group(group_id).await?;
        self.groups.list_members(group_id).await
    }

    /// Records a grant or deny override, replacing any prior one for the same code.
    pub async fn set_override(
        &self,
        actor: Option<PrincipalId>,
        principal_id: PrincipalId,
        code: &str,
        kind: OverrideKind,
    ) -> AppResult<Principal> {
        let authorized = self.require_admin(actor).await?;
        let code = self.known_code(code).await?;

        let granted_by = authorized.id();
        let entry = PermissionOverride {
            permission: code.clone(),
            kind,
            granted_by,
            granted_at: Utc::now(),
        };
        let entry_ref = &entry;
        let principal = self
            .update_principal(principal_id, "set_permission_override", move |principal| {
                principal.set_override(entry_ref.clone());
                Ok(())
            })
            .await?;

        info!(
            %granted_by,
            %principal_id,
            %code,
            kind = kind.as_str(),
            "permission override set"
        );
        self.append_event(
            &authorized,
            AuditAction::SecurityOverrideSet,
            "principal_override",
            format!("{principal_id}:{code}"),
            format!("{} '{code}' for '{principal_id}'", kind.as_str()),
        )
        .await;

        Ok(principal)
    }

    /// Clears the override for one code. Clearing an absent override is a no-op.
    pub async fn clear_override(
        &self,
        actor: Option<PrincipalId>,
        principal_id: PrincipalId,
        code: &str,
    ) -> AppResult<Principal> {
        let authorized = self.require_admin(actor).await?;
        let code = PermissionCode::new(code)?;

        let code_ref = &code;
        let principal = self
            .update_principal(principal_id, "clear_permission_override", move |principal| {
                principal.clear_override(code_ref);
                Ok(())
            })
            .await?;

        self.append_event(
            &authorized,
            AuditAction::SecurityOverrideCleared,
            "principal_override",
            format!("{principal_id}:{code}"),
            format!("cleared override '{code}' for '{principal_id}'"),
        )
        .await;

        Ok(principal)
    }

    /// Replaces the principal's individually selected permissions.
    pub async fn replace_selected_permissions(
        &self,
        actor: Option<PrincipalId>,
        principal_id: PrincipalId,
        codes: &[String],
    ) -> AppResult<Principal> {
        let authorized = self.require_admin(actor).await?;
        let selected = self.known_codes(codes).await?;

        let selected_ref = &selected;
        let principal = self
            .update_principal(principal_id, "replace_selected_permissions", move |principal| {
                principal.set_selected_permissions(selected_ref.iter().cloned());
                Ok(())
            })
            .await?;

        self.append_event(
            &authorized,
            AuditAction::SecuritySelectedPermissionsReplaced,
            "principal",
            principal_id.to_string(),
            format!("{} selected permission(s)", selected.len()),
        )
        .await;

        Ok(principal)
    }

    async fn require_admin(&self, actor: Option<PrincipalId>) -> AppResult<AuthorizedPrincipal> {
        let requirement = AccessRequirement::AnyOf {
            codes: [codes::USERS_MANAGE, codes::SYSTEM_MANAGE]
                .into_iter()
                .map(PermissionCode::new)
                .collect::<AppResult<Vec<_>>>()?,
        };
        self.guard.require(actor, &requirement).await
    }

    async fn require_group(&self, group_id: GroupId) -> AppResult<PermissionGroup> {
        self.groups
            .find_group(group_id)
            .await?
            .ok_or_else(|| AppError::not_found("group", group_id))
    }

    async fn require_principal(&self, principal_id: PrincipalId) -> AppResult<Principal> {
        self.principals
            .find_principal(principal_id)
            .await?
            .ok_or_else(|| AppError::not_found("principal", principal_id))
    }

    async fn known_code(&self, code: &str) -> AppResult<PermissionCode> {
        let catalog = self.catalog.load_catalog().await?;
        catalog
            .get(code)
            .map(|permission| permission.code().clone())
            .ok_or_else(|| AppError::not_found("permission", code.trim()))
    }

    async fn known_codes(&self, codes: &[String]) -> AppResult<Vec<PermissionCode>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = self.catalog.load_catalog().await?;
        codes
            .iter()
            .map(|code| {
                catalog
                    .get(code)
                    .map(|permission| permission.code().clone())
                    .ok_or_else(|| AppError::not_found("permission", code.trim()))
            })
            .collect()
    }

    async fn update_principal<F>(
        &self,
        principal_id: PrincipalId,
        operation: &str,
        apply: F,
    ) -> AppResult<Principal>
    where
        F: Fn(&mut Principal) -> AppResult<()> + Sync,
    {
        let repository = self.principals.as_ref();
        let apply = &apply;
        retry_on_conflict(self.retry_policy, operation, move || async move {
            let mut principal = repository
                .find_principal(principal_id)
                .await?
                .ok_or_else(|| AppError::not_found("principal", principal_id))?;
            apply(&mut principal)?;
            repository.save_principal(principal).await
        })
        .await
    }

    async fn append_event(
        &self,
        actor: &AuthorizedPrincipal,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) {
        let result = self
            .audit_repository
            .append_event(AuditEvent {
                subject: actor.id(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id: resource_id.clone(),
                detail: Some(detail),
            })
            .await;
        if let Err(error) = result {
            warn!(
                %error,
                subject = %actor.id(),
                resource_type,
                %resource_id,
                action = action.as_str(),
                "audit append failed after committed security change"
            );
        }
    }
}
