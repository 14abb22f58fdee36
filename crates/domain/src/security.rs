use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when contributors are assigned to an evidence item.
    EvidenceAssigned,
    /// Emitted when a contributor is removed from an evidence item.
    EvidenceUnassigned,
    /// Emitted when a file is uploaded.
    EvidenceFileUploaded,
    /// Emitted when an evidence item is submitted for approval.
    EvidenceSubmitted,
    /// Emitted when files are approved.
    EvidenceApproved,
    /// Emitted when files are rejected.
    EvidenceRejected,
    /// Emitted when a permission group is created.
    SecurityGroupCreated,
    /// Emitted when a group's permissions or active flag change.
    SecurityGroupUpdated,
    /// Emitted when a custom group is deleted.
    SecurityGroupDeleted,
    /// Emitted when a principal joins a group.
    SecurityGroupMemberAdded,
    /// Emitted when a principal leaves a group.
    SecurityGroupMemberRemoved,
    /// Emitted when an individual override is recorded.
    SecurityOverrideSet,
    /// Emitted when an individual override is cleared.
    SecurityOverrideCleared,
    /// Emitted when a principal's selected permissions are replaced.
    SecuritySelectedPermissionsReplaced,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EvidenceAssigned => "evidence.assigned",
            Self::EvidenceUnassigned => "evidence.unassigned",
            Self::EvidenceFileUploaded => "evidence.file.uploaded",
            Self::EvidenceSubmitted => "evidence.submitted",
            Self::EvidenceApproved => "evidence.approved",
            Self::EvidenceRejected => "evidence.rejected",
            Self::SecurityGroupCreated => "security.group.created",
            Self::SecurityGroupUpdated => "security.group.updated",
            Self::SecurityGroupDeleted => "security.group.deleted",
            Self::SecurityGroupMemberAdded => "security.group.member_added",
            Self::SecurityGroupMemberRemoved => "security.group.member_removed",
            Self::SecurityOverrideSet => "security.override.set",
            Self::SecurityOverrideCleared => "security.override.cleared",
            Self::SecuritySelectedPermissionsReplaced => "security.selected_permissions.replaced",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AuditAction;

    #[test]
    fn storage_values_are_namespaced() {
        assert_eq!(AuditAction::EvidenceApproved.as_str(), "evidence.approved");
        assert!(AuditAction::SecurityOverrideSet.as_str().starts_with("security."));
    }
}
