use std::sync::Arc;

use chrono::Utc;
use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::{
    AccessRequirement, AuditAction, DisplayStatus, Evidence, EvidenceId, EvidenceStatus, FileId,
    PermissionAction, PermissionCode, PermissionModule,
};
use tracing::{info, warn};

use crate::evidence_ports::require_evidence;
use crate::{
    AccessGuard, AuditEvent, AuditRepository, EvidenceRepository, WriteRetryPolicy,
    retry_on_conflict,
};

/// Evidence item together with its derived display status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceView {
    /// Stored evidence state.
    pub evidence: Evidence,
    /// Read-only status for reporting.
    pub display_status: DisplayStatus,
    /// Whether an approver may act now.
    pub needs_decision: bool,
}

impl EvidenceView {
    fn from_evidence(evidence: Evidence) -> Self {
        if evidence.status() == EvidenceStatus::Unknown {
            warn!(
                evidence_id = %evidence.id(),
                "evidence has an unrecognised stored status"
            );
        }

        Self {
            display_status: evidence.display_status(),
            needs_decision: evidence.needs_decision(),
            evidence,
        }
    }
}

/// Result of an approve or reject call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceDecision {
    /// Evidence after the decision.
    pub view: EvidenceView,
    /// Files decided by the call.
    pub decided: Vec<FileId>,
}

/// Input payload for recording an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFileInput {
    /// Original file name. Binary content is stored elsewhere.
    pub file_name: String,
}

/// Drives evidence items through upload, submission and approval.
#[derive(Clone)]
pub struct EvidenceLifecycle {
    guard: AccessGuard,
    evidence: Arc<dyn EvidenceRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    retry_policy: WriteRetryPolicy,
}

impl EvidenceLifecycle {
    /// Creates a lifecycle service from required dependencies.
    #[must_use]
    pub fn new(
        guard: AccessGuard,
        evidence: Arc<dyn EvidenceRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        retry_policy: WriteRetryPolicy,
    ) -> Self {
        Self {
            guard,
            evidence,
            audit_repository,
            retry_policy,
        }
    }

    /// Returns one evidence item with its display status.
    pub async fn view(
        &self,
        actor: Option<PrincipalId>,
        evidence_id: EvidenceId,
    ) -> AppResult<EvidenceView> {
        self.guard
            .require(actor, &requirement(PermissionAction::Read))
            .await?;

        let evidence = require_evidence(self.evidence.as_ref(), evidence_id).await?;
        Ok(EvidenceView::from_evidence(evidence))
    }

    /// Appends a pending file uploaded by an assigned contributor.
    ///
    /// Assignment is the only gate. The caller needs no evidence permission.
    pub async fn upload(
        &self,
        actor: Option<PrincipalId>,
        evidence_id: EvidenceId,
        input: UploadFileInput,
    ) -> AppResult<(EvidenceView, FileId)> {
        let uploader = self.require_contributor(actor).await?;
        let file_name = input.file_name.as_str();
        let repository = self.evidence.as_ref();
        let (evidence, file_id) =
            retry_on_conflict(self.retry_policy, "upload_evidence_file", move || async move {
                let mut evidence = require_evidence(repository, evidence_id).await?;
                let file_id = evidence.upload(uploader, file_name, Utc::now())?;
                Ok((repository.save_evidence(evidence).await?, file_id))
            })
            .await?;

        self.append_event(
            uploader,
            AuditAction::EvidenceFileUploaded,
            &evidence,
            format!("uploaded file '{}'", input.file_name.trim()),
        )
        .await;

        Ok((EvidenceView::from_evidence(evidence), file_id))
    }

    /// Submits the uploaded files for approval.
    pub async fn submit(
        &self,
        actor: Option<PrincipalId>,
        evidence_id: EvidenceId,
    ) -> AppResult<EvidenceView> {
        let submitter = self.require_contributor(actor).await?;
        let repository = self.evidence.as_ref();
        let evidence = retry_on_conflict(self.retry_policy, "submit_evidence", move || async move {
            let mut evidence = require_evidence(repository, evidence_id).await?;
            evidence.submit(submitter)?;
            repository.save_evidence(evidence).await
        })
        .await?;

        self.append_event(
            submitter,
            AuditAction::EvidenceSubmitted,
            &evidence,
            "submitted for approval".to_owned(),
        )
        .await;

        Ok(EvidenceView::from_evidence(evidence))
    }

    /// Approves the named pending files, or all pending files when none are named.
    pub async fn approve(
        &self,
        actor: Option<PrincipalId>,
        evidence_id: EvidenceId,
        file_ids: &[FileId],
    ) -> AppResult<EvidenceDecision> {
        let authorized = self
            .guard
            .require(actor, &requirement(PermissionAction::Approve))
            .await?;

        let approver = authorized.id();
        let repository = self.evidence.as_ref();
        let (evidence, outcome) =
            retry_on_conflict(self.retry_policy, "approve_evidence", move || async move {
                let mut evidence = require_evidence(repository, evidence_id).await?;
                let outcome = evidence.approve(approver, file_ids, Utc::now())?;
                Ok((repository.save_evidence(evidence).await?, outcome))
            })
            .await?;

        info!(
            %approver,
            %evidence_id,
            approved = outcome.decided.len(),
            status = outcome.status.as_str(),
            "evidence files approved"
        );
        self.append_event(
            approver,
            AuditAction::EvidenceApproved,
            &evidence,
            format!("approved {} file(s)", outcome.decided.len()),
        )
        .await;

        Ok(EvidenceDecision {
            view: EvidenceView::from_evidence(evidence),
            decided: outcome.decided,
        })
    }

    /// Rejects the named pending files with a mandatory reason.
    pub async fn reject(
        &self,
        actor: Option<PrincipalId>,
        evidence_id: EvidenceId,
        file_ids: &[FileId],
        reason: &str,
    ) -> AppResult<EvidenceDecision> {
        let authorized = self
            .guard
            .require(actor, &requirement(PermissionAction::Approve))
            .await?;

        let approver = authorized.id();
        let repository = self.evidence.as_ref();
        let (evidence, outcome) =
            retry_on_conflict(self.retry_policy, "reject_evidence", move || async move {
                let mut evidence = require_evidence(repository, evidence_id).await?;
                let outcome = evidence.reject(approver, file_ids, reason, Utc::now())?;
                Ok((repository.save_evidence(evidence).await?, outcome))
            })
            .await?;

        info!(
            %approver,
            %evidence_id,
            rejected = outcome.decided.len(),
            "evidence files rejected"
        );
        self.append_event(
            approver,
            AuditAction::EvidenceRejected,
            &evidence,
            format!("rejected {} file(s): {}", outcome.decided.len(), reason.trim()),
        )
        .await;

        Ok(EvidenceDecision {
            view: EvidenceView::from_evidence(evidence),
            decided: outcome.decided,
        })
    }

    /// Resolves an authenticated, active caller. Assignment is checked by the item.
    async fn require_contributor(&self, actor: Option<PrincipalId>) -> AppResult<PrincipalId> {
        self.guard
            .resolve_actor(actor)
            .await?
            .map(|authorized| authorized.id())
            .ok_or(AppError::Unauthenticated)
    }

    /// Records an audit event for a write that has already committed.
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
                "audit append failed after committed evidence write"
            );
        }
    }
}

fn requirement(action: PermissionAction) -> AccessRequirement {
    AccessRequirement::permission(PermissionCode::from_parts(PermissionModule::Evidences, action))
}
