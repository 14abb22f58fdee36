use std::sync::Arc;

use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::{
    AccessDecision, AccessRequirement, EffectivePermissions, PermissionResolver, Principal,
    PrincipalSnapshot, decide,
};
use tracing::{info, warn};

use crate::{PermissionCatalogRepository, PermissionGroupRepository, PrincipalRepository};

/// An active principal together with its resolved permissions.
#[derive(Debug, Clone)]
pub struct AuthorizedPrincipal {
    /// Loaded principal.
    pub principal: Principal,
    /// Effective permissions for this request.
    pub permissions: EffectivePermissions,
}

impl AuthorizedPrincipal {
    /// Returns the principal identifier.
    #[must_use]
    pub fn id(&self) -> PrincipalId {
        self.principal.id()
    }
}

/// Request-time access decisions built on [`PermissionResolver`].
#[derive(Clone)]
pub struct AccessGuard {
    principals: Arc<dyn PrincipalRepository>,
    groups: Arc<dyn PermissionGroupRepository>,
    catalog: Arc<dyn PermissionCatalogRepository>,
}

impl AccessGuard {
    /// Creates a guard from its collaborators.
    #[must_use]
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        groups: Arc<dyn PermissionGroupRepository>,
        catalog: Arc<dyn PermissionCatalogRepository>,
    ) -> Self {
        Self {
            principals,
            groups,
            catalog,
        }
    }

    /// Loads everything resolution needs for one principal.
    ///
    /// Returns `None` for unknown principals and for principals that are not active.
    pub async fn load_snapshot(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<PrincipalSnapshot>> {
        let Some(principal) = self
            .principals
            .find_principal(principal_id)
            .await
            .inspect_err(|error| log_collaborator_failure(principal_id, error))?
        else {
            return Ok(None);
        };
        if !principal.is_active() {
            info!(
                %principal_id,
                status = ?principal.status(),
                "inactive principal treated as unauthenticated"
            );
            return Ok(None);
        }

        let groups = self
            .groups
            .list_groups_for_principal(principal_id)
            .await
            .inspect_err(|error| log_collaborator_failure(principal_id, error))?;
        let catalog = self
            .catalog
            .load_catalog()
            .await
            .inspect_err(|error| log_collaborator_failure(principal_id, error))?;

        Ok(Some(PrincipalSnapshot {
            principal,
            groups,
            catalog,
        }))
    }

    /// Resolves the caller, or `None` when nobody is authenticated.
    pub async fn resolve_actor(
        &self,
        actor: Option<PrincipalId>,
    ) -> AppResult<Option<AuthorizedPrincipal>> {
        let Some(principal_id) = actor else {
            return Ok(None);
        };

        Ok(self
            .load_snapshot(principal_id)
            .await?
            .map(|snapshot| AuthorizedPrincipal {
                permissions: PermissionResolver::resolve(&snapshot),
                principal: snapshot.principal,
            }))
    }

    /// Decides whether the caller satisfies `requirement`.
    ///
    /// A denial is returned as a value. Only collaborator failures are errors.
    pub async fn authorize(
        &self,
        actor: Option<PrincipalId>,
        requirement: &AccessRequirement,
    ) -> AppResult<AccessDecision> {
        let resolved = self.resolve_actor(actor).await?;
        Ok(decide(
            resolved.as_ref().map(|resolved| &resolved.permissions),
            requirement,
        ))
    }

    /// Requires the caller to satisfy `requirement`, returning the resolved principal.
    pub async fn require(
        &self,
        actor: Option<PrincipalId>,
        requirement: &AccessRequirement,
    ) -> AppResult<AuthorizedPrincipal> {
        let resolved = self.resolve_actor(actor).await?;
        let decision = decide(
            resolved.as_ref().map(|resolved| &resolved.permissions),
            requirement,
        );

        if decision.is_allowed()
            && let Some(resolved) = resolved
        {
            return Ok(resolved);
        }

        info!(
            principal_id = actor.map(|id| id.to_string()),
            %requirement,
            "access denied"
        );
        Err(decision
            .into_result()
            .err()
            .unwrap_or(AppError::Unauthenticated))
    }
}

fn log_collaborator_failure(principal_id: PrincipalId, error: &AppError) {
    warn!(%principal_id, %error, "failed to load permission sources");
}
