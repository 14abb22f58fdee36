use axum::Json;
use axum::extract::{Extension, Path, State};
use evidentia_application::UploadFileInput;
use evidentia_core::{AppResult, PrincipalId};
use evidentia_domain::{EvidenceId, FileId};

use crate::dto::{
    ApproveEvidenceRequest, AssignEvidenceRequest, AssignmentsResponse, EvidenceDecisionResponse,
    EvidenceResponse, RejectEvidenceRequest, UploadFileRequest, UploadFileResponse,
};
use crate::error::ApiResult;
use crate::middleware::RequestPrincipal;
use crate::state::AppState;

pub async fn get_evidence_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(evidence_id): Path<String>,
) -> ApiResult<Json<EvidenceResponse>> {
    let view = state
        .evidence_lifecycle
        .view(actor, evidence_id.parse()?)
        .await?;

    Ok(Json(EvidenceResponse::from(view)))
}

pub async fn assign_evidence_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(evidence_id): Path<String>,
    Json(payload): Json<AssignEvidenceRequest>,
) -> ApiResult<Json<AssignmentsResponse>> {
    let evidence_id: EvidenceId = evidence_id.parse()?;
    let principal_ids = payload
        .principal_ids
        .iter()
        .map(|value| value.parse::<PrincipalId>())
        .collect::<AppResult<Vec<_>>>()?;

    let assigned = state
        .assignment_registry
        .assign(actor, evidence_id, &principal_ids)
        .await?;

    Ok(Json(assignments_response(evidence_id, assigned)))
}

pub async fn unassign_evidence_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path((evidence_id, principal_id)): Path<(String, String)>,
) -> ApiResult<Json<AssignmentsResponse>> {
    let evidence_id: EvidenceId = evidence_id.parse()?;
    let assigned = state
        .assignment_registry
        .unassign(actor, evidence_id, principal_id.parse()?)
        .await?;

    Ok(Json(assignments_response(evidence_id, assigned)))
}

pub async fn upload_evidence_file_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(evidence_id): Path<String>,
    Json(payload): Json<UploadFileRequest>,
) -> ApiResult<Json<UploadFileResponse>> {
    let (view, file_id) = state
        .evidence_lifecycle
        .upload(
            actor,
            evidence_id.parse()?,
            UploadFileInput {
                file_name: payload.file_name,
            },
        )
        .await?;

    Ok(Json(UploadFileResponse {
        file_id: file_id.to_string(),
        evidence: EvidenceResponse::from(view),
    }))
}

pub async fn submit_evidence_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(evidence_id): Path<String>,
) -> ApiResult<Json<EvidenceResponse>> {
    let view = state
        .evidence_lifecycle
        .submit(actor, evidence_id.parse()?)
        .await?;

    Ok(Json(EvidenceResponse::from(view)))
}

pub async fn approve_evidence_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(evidence_id): Path<String>,
    Json(payload): Json<ApproveEvidenceRequest>,
) -> ApiResult<Json<EvidenceDecisionResponse>> {
    let file_ids = parse_file_ids(&payload.file_ids)?;
    let decision = state
        .evidence_lifecycle
        .approve(actor, evidence_id.parse()?, &file_ids)
        .await?;

    Ok(Json(EvidenceDecisionResponse::from(decision)))
}

pub async fn reject_evidence_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(evidence_id): Path<String>,
    Json(payload): Json<RejectEvidenceRequest>,
) -> ApiResult<Json<EvidenceDecisionResponse>> {
    let file_ids = parse_file_ids(&payload.file_ids)?;
    let decision = state
        .evidence_lifecycle
        .reject(actor, evidence_id.parse()?, &file_ids, &payload.reason)
        .await?;

    Ok(Json(EvidenceDecisionResponse::from(decision)))
}

fn parse_file_ids(values: &[String]) -> AppResult<Vec<FileId>> {
    values.iter().map(|value| value.parse::<FileId>()).collect()
}

fn assignments_response(
    evidence_id: EvidenceId,
    assigned: impl IntoIterator<Item = PrincipalId>,
) -> AssignmentsResponse {
    AssignmentsResponse {
        evidence_id: evidence_id.to_string(),
        assigned_to: assigned
            .into_iter()
            .map(|principal| principal.to_string())
            .collect(),
    }
}
