use std::collections::BTreeSet;
use std::sync::Arc;

use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::{
    AccessRequirement, AuditAction, Evidence, EvidenceId, PermissionCode, PermissionAction,
    PermissionModule, codes,
};
use tracing::{info, warn};

use crate::evidence_ports::require_evidence;
use crate::{
    AccessGuard, AuditEvent, AuditRepository, AuthorizedPrincipal, EvidenceRepository,
    PrincipalRepository, WriteRetryPolicy, retry_on_conflict,
};

/// Records which principals may contribute files to an evidence item.
#[derive(Clone)]
pub struct AssignmentRegistry {
    guard: AccessGuard,
    principals: Arc<dyn PrincipalRepository>,
    evidence: Arc<dyn EvidenceRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    retry_policy: WriteRetryPolicy,
}

impl AssignmentRegistry {
    /// Creates a registry from required dependencies.
    #[must_use]
    pub fn new(
        guard: AccessGuard,
        principals: Arc<dyn PrincipalRepository>,
        evidence: Arc<dyn EvidenceRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        retry_policy: WriteRetryPolicy,
    ) -> Self {
        Self {
            guard,
            principals,
            evidence,
            audit_repository,
            retry_policy,
        }
    }

    /// Adds contributors to an evidence item and returns the full assigned set.
    ///
    /// Assigning an existing contributor is a no-op.
    pub async fn assign(
        &self,
        actor: Option<PrincipalId>,
        evidence_id: EvidenceId,
        principal_ids: &[PrincipalId],
    ) -> AppResult<BTreeSet<PrincipalId>> {
        let authorized = self.guard.require(actor, &manage_requirement()).await?;
        for principal_id in principal_ids {
            if self
                .principals
                .find_principal(*principal_id)
                .await?
                .is_none()
            {
                return Err(AppError::not_found("principal", principal_id));
            }
        }

        let authorized_ref = &authorized;
        let repository = self.evidence.as_ref();
        let (evidence, added) =
            retry_on_conflict(self.retry_policy, "assign_evidence", move || async move {
                let mut evidence = require_evidence(repository, evidence_id).await?;
                ensure_department_scope(authorized_ref, &evidence)?;
                let added = evidence.assign(principal_ids)?;
                if added == 0 {
                    return Ok((evidence, 0));
                }
                Ok((repository.save_evidence(evidence).await?, added))
            })
            .await?;

        info!(
            actor = %authorized.id(),
            %evidence_id,
            added,
            assignees = evidence.assigned_to().len(),
            "evidence contributors assigned"
        );
        if added > 0 {
            self.append_event(
                authorized.id(),
                AuditAction::EvidenceAssigned,
                &evidence,
                format!("assigned {added} contributor(s) to '{}'", evidence.code()),
            )
            .await;
        }

        Ok(evidence.assigned_to().clone())
    }

    /// Removes one contributor. Removing an absent contributor is a no-op.
    pub async fn unassign(
        &self,
        actor: Option<PrincipalId>,
        evidence_id: EvidenceId,
        principal_id: PrincipalId,
    ) -> AppResult<BTreeSet<PrincipalId>> {
        let authorized = self.guard.require(actor, &manage_requirement()).await?;

        let authorized_ref = &authorized;
        let repository = self.evidence.as_ref();
        let (evidence, removed) =
            retry_on_conflict(self.retry_policy, "unassign_evidence", move || async move {
                let mut evidence = require_evidence(repository, evidence_id).await?;
                ensure_department_scope(authorized_ref, &evidence)?;
                if !evidence.unassign(principal_id) {
                    return Ok((evidence, false));
                }
                Ok((repository.save_evidence(evidence).await?, true))
            })
            .await?;

        if removed {
            self.append_event(
                authorized.id(),
                AuditAction::EvidenceUnassigned,
                &evidence,
                format!(
                    "removed contributor '{principal_id}' from '{}'",
                    evidence.code()
                ),
            )
            .await;
        }

        Ok(evidence.assigned_to().clone())
    }

    /// Records an audit event after the assignment change has committed.
    ///
    /// A failed append is logged and does not fail the call.
    async fn append_event(
        &self,
        subject: PrincipalId,
        action: AuditAction,
        evidence: &Evidence,
        detail: String,
    ) {
        let result = self
            .audit_repository
            .append_event(AuditEvent {
                subject,
                action,
                resource_type: "evidence".to_owned(),
                resource_id: evidence.id().to_string(),
                detail: Some(detail),
            })
            .await;
        if let Err(error) = result {
            warn!(
                %error,
                %subject,
                evidence_id = %evidence.id(),
                action = action.as_str(),
                "audit append failed after committed assignment change"
            );
        }
    }
}

fn manage_requirement() -> AccessRequirement {
    AccessRequirement::permission(PermissionCode::from_parts(
        PermissionModule::Evidences,
        PermissionAction::Assign,
    ))
}

/// Managers act on their own department. `SYSTEM.MANAGE` crosses departments.
fn ensure_department_scope(actor: &AuthorizedPrincipal, evidence: &Evidence) -> AppResult<()> {
    if actor.principal.department() == Some(evidence.department())
        || actor.permissions.has_permission(codes::SYSTEM_MANAGE)
    {
        return Ok(());
    }

    info!(
        actor = %actor.id(),
        evidence_id = %evidence.id(),
        department = %evidence.department(),
        "evidence management outside own department denied"
    );
    Err(AppError::Forbidden {
        requirement: format!(
            "{} in department '{}'",
            codes::EVIDENCES_ASSIGN,
            evidence.department()
        ),
    })
}
