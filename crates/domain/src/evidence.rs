//! Evidence items and the file approval state machine.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use evidentia_core::{AppError, AppResult, NonEmptyString, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::{DepartmentId, EvidenceId, FileId};

/// Stored processing status of an evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    /// Created, nobody assigned.
    New,
    /// Contributors assigned, nothing uploaded.
    Assigned,
    /// Files are being uploaded.
    InProgress,
    /// Submitted and awaiting a decision.
    PendingApproval,
    /// Every file of the batch was approved.
    Approved,
    /// At least one file of the batch was rejected.
    Rejected,
    /// Stored value outside the known set.
    Unknown,
}

impl EvidenceStatus {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }

    /// Reads a persisted value, mapping anything unrecognised to [`Self::Unknown`].
    #[must_use]
    pub fn from_storage(value: &str) -> Self {
        value.parse().unwrap_or(Self::Unknown)
    }

    /// Returns whether the current file batch is finished.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl Display for EvidenceStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EvidenceStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::validation(
                "status",
                format!("unknown evidence status '{value}'"),
            )),
        }
    }
}

/// Per-file approval state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileApprovalStatus {
    /// Awaiting a decision.
    Pending,
    /// Accepted. Terminal.
    Approved,
    /// Refused with a reason. Terminal.
    Rejected,
}

impl FileApprovalStatus {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for FileApprovalStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::validation(
                "approval_status",
                format!("unknown file approval status '{value}'"),
            )),
        }
    }
}

/// Read-only status shown to reporting and UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// New item without any file.
    NoFiles,
    /// New item.
    New,
    /// Contributors assigned.
    Assigned,
    /// Uploading, nothing pending.
    InProgress,
    /// Waiting for an approver.
    PendingApproval,
    /// Approved.
    Approved,
    /// Rejected.
    Rejected,
    /// Stored status outside the known set.
    Unknown,
}

impl DisplayStatus {
    /// Returns the stable display value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFiles => "no_files",
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }
}

/// Metadata of one uploaded artifact. Binary content lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFile {
    id: FileId,
    name: String,
    approval_status: FileApprovalStatus,
    rejection_reason: Option<String>,
    uploaded_by: PrincipalId,
    uploaded_at: DateTime<Utc>,
    decided_by: Option<PrincipalId>,
    decided_at: Option<DateTime<Utc>>,
}

impl EvidenceFile {
    /// Returns the file identifier.
    #[must_use]
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Returns the original file name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the approval status.
    #[must_use]
    pub fn approval_status(&self) -> FileApprovalStatus {
        self.approval_status
    }

    /// Returns the rejection reason, set only on rejected files.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Returns the uploader.
    #[must_use]
    pub fn uploaded_by(&self) -> PrincipalId {
        self.uploaded_by
    }

    /// Returns the upload time.
    #[must_use]
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    /// Returns the approver who decided the file.
    #[must_use]
    pub fn decided_by(&self) -> Option<PrincipalId> {
        self.decided_by
    }

    /// Returns when the file was decided.
    #[must_use]
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    fn is_pending(&self) -> bool {
        self.approval_status == FileApprovalStatus::Pending
    }

    fn decide(
        &mut self,
        status: FileApprovalStatus,
        reason: Option<String>,
        actor: PrincipalId,
        at: DateTime<Utc>,
    ) {
        self.approval_status = status;
        self.rejection_reason = reason;
        self.decided_by = Some(actor);
        self.decided_at = Some(at);
    }
}

/// Result of an approve or reject call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    /// Files decided by this call.
    pub decided: Vec<FileId>,
    /// Evidence status after the call.
    pub status: EvidenceStatus,
}

/// A document-of-record moving through upload and approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    id: EvidenceId,
    code: String,
    name: String,
    department: DepartmentId,
    status: EvidenceStatus,
    assigned_to: BTreeSet<PrincipalId>,
    files: Vec<EvidenceFile>,
    version: u64,
}

impl Evidence {
    /// Creates a new evidence item without assignees or files.
    pub fn new(code: &str, name: &str, department: DepartmentId) -> AppResult<Self> {
        let code = NonEmptyString::new("code", code.trim())?;
        let name = NonEmptyString::new("name", name.trim())?;

        Ok(Self {
            id: EvidenceId::new(),
            code: code.into(),
            name: name.into(),
            department,
            status: EvidenceStatus::New,
            assigned_to: BTreeSet::new(),
            files: Vec::new(),
            version: 0,
        })
    }

    /// Returns the evidence identifier.
    #[must_use]
    pub fn id(&self) -> EvidenceId {
        self.id
    }

    /// Returns the human-facing evidence code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the owning department.
    #[must_use]
    pub fn department(&self) -> DepartmentId {
        self.department
    }

    /// Returns the stored status.
    #[must_use]
    pub fn status(&self) -> EvidenceStatus {
        self.status
    }

    /// Returns the assigned contributors.
    #[must_use]
    pub fn assigned_to(&self) -> &BTreeSet<PrincipalId> {
        &self.assigned_to
    }

    /// Returns files in upload order.
    #[must_use]
    pub fn files(&self) -> &[EvidenceFile] {
        &self.files
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

    /// Overwrites the stored status with a raw persisted value. Reserved for persistence adapters.
    pub fn restore_status(&mut self, value: &str) {
        self.status = EvidenceStatus::from_storage(value);
    }

    /// Returns whether `principal` may contribute files.
    #[must_use]
    pub fn is_assignee(&self, principal: PrincipalId) -> bool {
        self.assigned_to.contains(&principal)
    }

    /// Returns whether any file awaits a decision.
    #[must_use]
    pub fn has_pending_files(&self) -> bool {
        self.files.iter().any(EvidenceFile::is_pending)
    }

    /// Returns whether an approver may act on this item now.
    #[must_use]
    pub fn needs_decision(&self) -> bool {
        match self.status {
            EvidenceStatus::PendingApproval => true,
            EvidenceStatus::InProgress => self.has_pending_files(),
            _ => false,
        }
    }

    /// Derives the read-only display status.
    ///
    /// An `in_progress` item that already holds a pending file displays as
    /// `pending_approval` before it is submitted.
    #[must_use]
    pub fn display_status(&self) -> DisplayStatus {
        match self.status {
            EvidenceStatus::New if self.files.is_empty() => DisplayStatus::NoFiles,
            EvidenceStatus::New => DisplayStatus::New,
            EvidenceStatus::Assigned => DisplayStatus::Assigned,
            EvidenceStatus::InProgress if self.has_pending_files() => {
                DisplayStatus::PendingApproval
            }
            EvidenceStatus::InProgress => DisplayStatus::InProgress,
            EvidenceStatus::PendingApproval => DisplayStatus::PendingApproval,
            EvidenceStatus::Approved => DisplayStatus::Approved,
            EvidenceStatus::Rejected => DisplayStatus::Rejected,
            EvidenceStatus::Unknown => DisplayStatus::Unknown,
        }
    }

    /// Ensures `principal` is an assignee of this item.
    pub fn ensure_assignee(&self, principal: PrincipalId) -> AppResult<()> {
        if self.is_assignee(principal) {
            return Ok(());
        }

        Err(AppError::Forbidden {
            requirement: format!("assignment to evidence '{}'", self.id),
        })
    }

    /// Adds contributors, returning how many were new. Existing assignees are kept.
    pub fn assign(&mut self, principals: &[PrincipalId]) -> AppResult<usize> {
        if principals.is_empty() {
            return Err(AppError::validation(
                "principal_ids",
                "at least one contributor must be assigned",
            ));
        }
        if matches!(
            self.status,
            EvidenceStatus::Approved | EvidenceStatus::Rejected | EvidenceStatus::Unknown
        ) {
            return Err(self.transition_error(EvidenceStatus::Assigned));
        }

        let added = principals
            .iter()
            .filter(|principal| self.assigned_to.insert(**principal))
            .count();
        if self.status == EvidenceStatus::New {
            self.status = EvidenceStatus::Assigned;
        }

        Ok(added)
    }

    /// Removes one contributor. Removing an absent contributor is a no-op.
    ///
    /// An assigned item with no assignees and no files falls back to `new`.
    pub fn unassign(&mut self, principal: PrincipalId) -> bool {
        let removed = self.assigned_to.remove(&principal);
        if self.status == EvidenceStatus::Assigned
            && self.assigned_to.is_empty()
            && self.files.is_empty()
        {
            self.status = EvidenceStatus::New;
        }

        removed
    }

    /// Appends a pending file uploaded by an assignee.
    pub fn upload(
        &mut self,
        uploader: PrincipalId,
        file_name: &str,
        at: DateTime<Utc>,
    ) -> AppResult<FileId> {
        self.ensure_assignee(uploader)?;
        if !matches!(
            self.status,
            EvidenceStatus::New | EvidenceStatus::Assigned | EvidenceStatus::InProgress
        ) {
            return Err(self.transition_error(EvidenceStatus::InProgress));
        }
        let name = NonEmptyString::new("file_name", file_name.trim())?;

        let file = EvidenceFile {
            id: FileId::new(),
            name: name.into(),
            approval_status: FileApprovalStatus::Pending,
            rejection_reason: None,
            uploaded_by: uploader,
            uploaded_at: at,
            decided_by: None,
            decided_at: None,
        };
        let file_id = file.id;
        self.files.push(file);
        self.status = EvidenceStatus::InProgress;

        Ok(file_id)
    }

    /// Submits pending files for approval. Uploads are blocked until a decision.
    pub fn submit(&mut self, actor: PrincipalId) -> AppResult<()> {
        self.ensure_assignee(actor)?;
        if self.status != EvidenceStatus::InProgress {
            return Err(self.transition_error(EvidenceStatus::PendingApproval));
        }
        if !self.has_pending_files() {
            return Err(AppError::validation(
                "files",
                "at least one pending file is required to submit",
            ));
        }

        self.status = EvidenceStatus::PendingApproval;
        Ok(())
    }

    /// Approves the named pending files, or every pending file when `file_ids` is empty.
    ///
    /// The item becomes `approved` once nothing is pending.
    pub fn approve(
        &mut self,
        approver: PrincipalId,
        file_ids: &[FileId],
        at: DateTime<Utc>,
    ) -> AppResult<DecisionOutcome> {
        if !self.needs_decision() {
            return Err(self.transition_error(EvidenceStatus::Approved));
        }
        let targets = self.pending_targets(file_ids, FileApprovalStatus::Approved)?;

        for file in self
            .files
            .iter_mut()
            .filter(|file| targets.contains(&file.id))
        {
            file.decide(FileApprovalStatus::Approved, None, approver, at);
        }
        if !self.has_pending_files() {
            self.status = EvidenceStatus::Approved;
        }

        Ok(DecisionOutcome {
            decided: targets,
            status: self.status,
        })
    }

    /// Rejects the named pending files with a reason. The item becomes `rejected`.
    ///
    /// Rejection closes the batch: files still pending are rejected with the
    /// same reason and reported in the outcome after the named ones.
    pub fn reject(
        &mut self,
        approver: PrincipalId,
        file_ids: &[FileId],
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<DecisionOutcome> {
        let reason = NonEmptyString::new("rejection_reason", reason.trim())?;
        if file_ids.is_empty() {
            return Err(AppError::validation(
                "file_ids",
                "at least one file must be named for rejection",
            ));
        }
        if !self.needs_decision() {
            return Err(self.transition_error(EvidenceStatus::Rejected));
        }
        let mut targets = self.pending_targets(file_ids, FileApprovalStatus::Rejected)?;
        for file in self.files.iter().filter(|file| file.is_pending()) {
            if !targets.contains(&file.id) {
                targets.push(file.id);
            }
        }

        for file in self.files.iter_mut().filter(|file| file.is_pending()) {
            file.decide(
                FileApprovalStatus::Rejected,
                Some(reason.as_str().to_owned()),
                approver,
                at,
            );
        }
        self.status = EvidenceStatus::Rejected;

        Ok(DecisionOutcome {
            decided: targets,
            status: self.status,
        })
    }

    fn pending_targets(
        &self,
        file_ids: &[FileId],
        target: FileApprovalStatus,
    ) -> AppResult<Vec<FileId>> {
        if file_ids.is_empty() {
            return Ok(self
                .files
                .iter()
                .filter(|file| file.is_pending())
                .map(EvidenceFile::id)
                .collect());
        }

        let mut targets = Vec::with_capacity(file_ids.len());
        for file_id in file_ids {
            let file = self
                .files
                .iter()
                .find(|file| file.id == *file_id)
                .ok_or_else(|| AppError::not_found("evidence_file", file_id))?;
            if !file.is_pending() {
                return Err(AppError::invalid_transition(
                    file.approval_status.as_str(),
                    target.as_str(),
                ));
            }
            if !targets.contains(file_id) {
                targets.push(*file_id);
            }
        }

        Ok(targets)
    }

    fn transition_error(&self, to: EvidenceStatus) -> AppError {
        AppError::invalid_transition(self.status.as_str(), to.as_str())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use evidentia_core::{AppError, PrincipalId};

    use super::{DisplayStatus, Evidence, EvidenceStatus, FileApprovalStatus};
    use crate::{DepartmentId, FileId};

    fn evidence() -> Evidence {
        Evidence::new("H1.01.02.04", "Quality assurance plan", DepartmentId::new())
            .unwrap_or_else(|_| panic!("valid evidence"))
    }

    fn uploaded(contributor: PrincipalId) -> (Evidence, FileId) {
        let mut evidence = evidence();
        let _ = evidence.assign(&[contributor]);
        let file_id = evidence
            .upload(contributor, "plan.pdf", Utc::now())
            .unwrap_or_else(|_| panic!("upload accepted"));
        (evidence, file_id)
    }

    #[test]
    fn fresh_item_displays_as_no_files() {
        let evidence = evidence();
        assert_eq!(evidence.status(), EvidenceStatus::New);
        assert_eq!(evidence.display_status(), DisplayStatus::NoFiles);
    }

    #[test]
    fn assigning_twice_keeps_one_entry() {
        let mut evidence = evidence();
        let contributor = PrincipalId::new();

        assert_eq!(evidence.assign(&[contributor]).ok(), Some(1));
        assert_eq!(evidence.assign(&[contributor]).ok(), Some(0));
        assert_eq!(evidence.assigned_to().len(), 1);
        assert_eq!(evidence.status(), EvidenceStatus::Assigned);
    }

    #[test]
    fn assigning_nobody_is_a_validation_error() {
        let mut evidence = evidence();
        assert!(matches!(
            evidence.assign(&[]),
            Err(AppError::Validation { ref field, .. }) if field == "principal_ids"
        ));
    }

    #[test]
    fn unassigning_last_contributor_reverts_to_new() {
        let mut evidence = evidence();
        let contributor = PrincipalId::new();
        let _ = evidence.assign(&[contributor]);

        assert!(evidence.unassign(contributor));
        assert!(!evidence.unassign(contributor));
        assert_eq!(evidence.status(), EvidenceStatus::New);
    }

    #[test]
    fn non_assignee_cannot_upload() {
        let mut evidence = evidence();
        let result = evidence.upload(PrincipalId::new(), "plan.pdf", Utc::now());
        assert!(matches!(result, Err(AppError::Forbidden { .. })));
        assert!(evidence.files().is_empty());
    }

    #[test]
    fn upload_displays_pending_before_submission() {
        let contributor = PrincipalId::new();
        let (evidence, _) = uploaded(contributor);

        assert_eq!(evidence.status(), EvidenceStatus::InProgress);
        assert_eq!(evidence.display_status(), DisplayStatus::PendingApproval);
        assert!(evidence.needs_decision());
    }

    #[test]
    fn submission_blocks_further_uploads() {
        let contributor = PrincipalId::new();
        let (mut evidence, _) = uploaded(contributor);

        assert!(evidence.submit(contributor).is_ok());
        assert_eq!(evidence.status(), EvidenceStatus::PendingApproval);
        assert!(matches!(
            evidence.upload(contributor, "late.pdf", Utc::now()),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn submit_without_files_is_out_of_order() {
        let contributor = PrincipalId::new();
        let mut evidence = evidence();
        let _ = evidence.assign(&[contributor]);

        assert!(matches!(
            evidence.submit(contributor),
            Err(AppError::InvalidTransition { ref from, ref to })
                if from == "assigned" && to == "pending_approval"
        ));
    }

    #[test]
    fn approving_last_pending_file_approves_item() {
        let contributor = PrincipalId::new();
        let approver = PrincipalId::new();
        let (mut evidence, file_id) = uploaded(contributor);

        let outcome = evidence.approve(approver, &[file_id], Utc::now());
        assert_eq!(
            outcome.map(|outcome| outcome.status).ok(),
            Some(EvidenceStatus::Approved)
        );
        let file = &evidence.files()[0];
        assert_eq!(file.approval_status(), FileApprovalStatus::Approved);
        assert_eq!(file.decided_by(), Some(approver));
    }

    #[test]
    fn partial_approval_keeps_item_open() {
        let contributor = PrincipalId::new();
        let (mut evidence, first) = uploaded(contributor);
        let _ = evidence.upload(contributor, "annex.pdf", Utc::now());
        let _ = evidence.submit(contributor);

        let outcome = evidence.approve(PrincipalId::new(), &[first], Utc::now());
        assert_eq!(
            outcome.map(|outcome| outcome.status).ok(),
            Some(EvidenceStatus::PendingApproval)
        );
        assert!(evidence.needs_decision());
    }

    #[test]
    fn rejection_requires_reason() {
        let contributor = PrincipalId::new();
        let (mut evidence, file_id) = uploaded(contributor);

        assert!(matches!(
            evidence.reject(PrincipalId::new(), &[file_id], "  ", Utc::now()),
            Err(AppError::Validation { ref field, .. }) if field == "rejection_reason"
        ));

        let outcome = evidence.reject(PrincipalId::new(), &[file_id], "incomplete", Utc::now());
        assert_eq!(
            outcome.map(|outcome| outcome.decided).ok(),
            Some(vec![file_id])
        );
        assert_eq!(evidence.status(), EvidenceStatus::Rejected);
        assert_eq!(evidence.files()[0].rejection_reason(), Some("incomplete"));
    }

    #[test]
    fn rejection_closes_remaining_pending_files() {
        let contributor = PrincipalId::new();
        let (mut evidence, first) = uploaded(contributor);
        let second = evidence
            .upload(contributor, "annex.pdf", Utc::now())
            .unwrap_or_else(|_| panic!("upload accepted"));
        let _ = evidence.submit(contributor);

        let outcome = evidence
            .reject(PrincipalId::new(), &[first], "missing signature", Utc::now())
            .unwrap_or_else(|error| panic!("rejection accepted: {error}"));

        assert_eq!(outcome.decided, vec![first, second]);
        assert_eq!(outcome.status, EvidenceStatus::Rejected);
        assert!(!evidence.has_pending_files());
        assert!(evidence.files().iter().all(|file| {
            file.approval_status() == FileApprovalStatus::Rejected
                && file.rejection_reason() == Some("missing signature")
        }));
    }

    #[test]
    fn decided_files_cannot_be_decided_again() {
        let contributor = PrincipalId::new();
        let (mut evidence, file_id) = uploaded(contributor);
        let _ = evidence.reject(PrincipalId::new(), &[file_id], "blurry scan", Utc::now());

        assert!(matches!(
            evidence.approve(PrincipalId::new(), &[file_id], Utc::now()),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn unknown_file_is_not_found() {
        let contributor = PrincipalId::new();
        let (mut evidence, _) = uploaded(contributor);

        assert!(matches!(
            evidence.approve(PrincipalId::new(), &[FileId::new()], Utc::now()),
            Err(AppError::NotFound { kind: "evidence_file", .. })
        ));
    }

    #[test]
    fn unrecognised_stored_status_is_unknown() {
        let mut evidence = evidence();
        evidence.restore_status("archived");

        assert_eq!(evidence.status(), EvidenceStatus::Unknown);
        assert_eq!(evidence.display_status(), DisplayStatus::Unknown);
        assert!("archived".parse::<EvidenceStatus>().is_err());
    }
}
