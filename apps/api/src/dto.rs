use chrono::{DateTime, Utc};
use evidentia_application::{AuthorizedPrincipal, EvidenceDecision, EvidenceView};
use evidentia_domain::{
    EvidenceFile, PermissionGroup, PermissionOverride, Principal, RoleCapability,
};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Effective access of the calling principal.
#[derive(Debug, Serialize)]
pub struct AccessProfileResponse {
    pub principal_id: String,
    pub display_name: String,
    pub roles: Vec<&'static str>,
    pub capabilities: Vec<&'static str>,
    pub permissions: Vec<String>,
}

impl From<AuthorizedPrincipal> for AccessProfileResponse {
    fn from(value: AuthorizedPrincipal) -> Self {
        let capabilities = [RoleCapability::Admin, RoleCapability::ManagerOrAbove]
            .into_iter()
            .filter(|capability| value.permissions.has_capability(*capability))
            .map(|capability| capability.as_str())
            .collect();

        Self {
            principal_id: value.principal.id().to_string(),
            display_name: value.principal.display_name().to_owned(),
            roles: value.principal.roles().iter().map(|role| role.as_str()).collect(),
            capabilities,
            permissions: value
                .permissions
                .codes()
                .map(|code| code.as_str().to_owned())
                .collect(),
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Serialize)]
pub struct AccessCheckResponse {
    pub allowed: bool,
    pub requirement: String,
}

/// API representation of one uploaded evidence file.
#[derive(Debug, Serialize)]
pub struct EvidenceFileResponse {
    pub file_id: String,
    pub name: String,
    pub approval_status: &'static str,
    pub rejection_reason: Option<String>,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<&EvidenceFile> for EvidenceFileResponse {
    fn from(value: &EvidenceFile) -> Self {
        Self {
            file_id: value.id().to_string(),
            name: value.name().to_owned(),
            approval_status: value.approval_status().as_str(),
            rejection_reason: value.rejection_reason().map(str::to_owned),
            uploaded_by: value.uploaded_by().to_string(),
            uploaded_at: value.uploaded_at(),
            decided_by: value.decided_by().map(|principal| principal.to_string()),
            decided_at: value.decided_at(),
        }
    }
}

/// API representation of an evidence item.
#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
    pub evidence_id: String,
    pub code: String,
    pub name: String,
    pub department_id: String,
    pub status: &'static str,
    pub display_status: &'static str,
    pub needs_decision: bool,
    pub assigned_to: Vec<String>,
    pub files: Vec<EvidenceFileResponse>,
    pub version: u64,
}

impl From<EvidenceView> for EvidenceResponse {
    fn from(value: EvidenceView) -> Self {
        let evidence = value.evidence;
        Self {
            evidence_id: evidence.id().to_string(),
            code: evidence.code().to_owned(),
            name: evidence.name().to_owned(),
            department_id: evidence.department().to_string(),
            status: evidence.status().as_str(),
            display_status: value.display_status.as_str(),
            needs_decision: value.needs_decision,
            assigned_to: evidence
                .assigned_to()
                .iter()
                .map(ToString::to_string)
                .collect(),
            files: evidence.files().iter().map(EvidenceFileResponse::from).collect(),
            version: evidence.version(),
        }
    }
}

/// Incoming payload for evidence assignment.
#[derive(Debug, Deserialize)]
pub struct AssignEvidenceRequest {
    pub principal_ids: Vec<String>,
}

/// Assignee set after an assignment change.
#[derive(Debug, Serialize)]
pub struct AssignmentsResponse {
    pub evidence_id: String,
    pub assigned_to: Vec<String>,
}

/// Incoming payload describing an uploaded file.
#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    pub file_name: String,
}

/// Evidence state after an upload, with the new file identifier.
#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    pub file_id: String,
    pub evidence: EvidenceResponse,
}

/// Incoming payload for approval. An empty list approves every pending file.
#[derive(Debug, Default, Deserialize)]
pub struct ApproveEvidenceRequest {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// Incoming payload for rejection.
#[derive(Debug, Deserialize)]
pub struct RejectEvidenceRequest {
    #[serde(default)]
    pub file_ids: Vec<String>,
    pub reason: String,
}

/// Evidence state after a decision.
#[derive(Debug, Serialize)]
pub struct EvidenceDecisionResponse {
    pub decided: Vec<String>,
    pub evidence: EvidenceResponse,
}

impl From<EvidenceDecision> for EvidenceDecisionResponse {
    fn from(value: EvidenceDecision) -> Self {
        Self {
            decided: value.decided.iter().map(ToString::to_string).collect(),
            evidence: EvidenceResponse::from(value.view),
        }
    }
}

/// Incoming payload for permission group creation.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub code: String,
    pub name: String,
    pub priority: u8,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload for permission group updates.
#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
    pub active: Option<bool>,
}

/// API representation of a permission group.
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub group_id: String,
    pub code: String,
    pub name: String,
    pub kind: &'static str,
    pub priority: u8,
    pub active: bool,
    pub permissions: Vec<String>,
}

impl From<PermissionGroup> for GroupResponse {
    fn from(value: PermissionGroup) -> Self {
        Self {
            group_id: value.id().to_string(),
            code: value.code().to_owned(),
            name: value.name().to_owned(),
            kind: value.kind().as_str(),
            priority: value.priority(),
            active: value.is_active(),
            permissions: value
                .permissions()
                .iter()
                .map(|code| code.as_str().to_owned())
                .collect(),
        }
    }
}

/// Incoming payload for group membership.
#[derive(Debug, Deserialize)]
pub struct AddGroupMemberRequest {
    pub principal_id: String,
}

/// Incoming payload for an individual grant or deny.
#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    pub permission: String,
    pub kind: String,
}

/// Incoming payload replacing a principal's selected permissions.
#[derive(Debug, Deserialize)]
pub struct ReplaceSelectedPermissionsRequest {
    pub permissions: Vec<String>,
}

/// API representation of one individual override.
#[derive(Debug, Serialize)]
pub struct OverrideResponse {
    pub permission: String,
    pub kind: &'static str,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}

impl From<&PermissionOverride> for OverrideResponse {
    fn from(value: &PermissionOverride) -> Self {
        Self {
            permission: value.permission.as_str().to_owned(),
            kind: value.kind.as_str(),
            granted_by: value.granted_by.to_string(),
            granted_at: value.granted_at,
        }
    }
}

/// Individually managed permissions of one principal.
#[derive(Debug, Serialize)]
pub struct PrincipalPermissionsResponse {
    pub principal_id: String,
    pub selected_permissions: Vec<String>,
    pub overrides: Vec<OverrideResponse>,
    pub version: u64,
}

impl From<Principal> for PrincipalPermissionsResponse {
    fn from(value: Principal) -> Self {
        Self {
            principal_id: value.id().to_string(),
            selected_permissions: value
                .selected_permissions()
                .iter()
                .map(|code| code.as_str().to_owned())
                .collect(),
            overrides: value.overrides().map(OverrideResponse::from).collect(),
            version: value.version(),
        }
    }
}
