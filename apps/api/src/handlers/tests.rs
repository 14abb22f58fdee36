use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use evidentia_application::{EvidenceRepository, WriteRetryPolicy};
use evidentia_core::PrincipalId;
use evidentia_domain::{DepartmentId, Evidence, EvidenceId};

use crate::dev_seed::{
    self, DEV_SEED_ADMIN_ID, DEV_SEED_DEPARTMENT_ID, DEV_SEED_EXPERT_ID, DEV_SEED_MANAGER_ID,
};
use crate::dto::{
    ApproveEvidenceRequest, AssignEvidenceRequest, RejectEvidenceRequest, SetOverrideRequest,
    UploadFileRequest,
};
use crate::error::ApiError;
use crate::middleware::RequestPrincipal;
use crate::state::{AppState, Repositories, build_app_state};

use super::{access, evidences, security};

struct Harness {
    state: AppState,
    evidence_id: EvidenceId,
}

fn seed_id(value: &str) -> PrincipalId {
    value
        .parse()
        .unwrap_or_else(|error| panic!("seed id should parse: {error}"))
}

fn caller(value: &str) -> Extension<RequestPrincipal> {
    Extension(RequestPrincipal(Some(seed_id(value))))
}

async fn harness() -> Harness {
    let repositories = Repositories::default();
    if let Err(error) = dev_seed::run(&repositories).await {
        panic!("seed should load: {error}");
    }
    let department: DepartmentId = DEV_SEED_DEPARTMENT_ID
        .parse()
        .unwrap_or_else(|error| panic!("department should parse: {error}"));
    let evidence = Evidence::new("H2.01.01.01", "Training curriculum", department)
        .unwrap_or_else(|error| panic!("evidence should be valid: {error}"));
    let saved = repositories
        .evidence
        .save_evidence(evidence)
        .await
        .unwrap_or_else(|error| panic!("evidence should save: {error}"));

    Harness {
        state: build_app_state(&repositories, WriteRetryPolicy::default()),
        evidence_id: saved.id(),
    }
}

fn status_of(error: ApiError) -> StatusCode {
    error.into_response().status()
}

#[tokio::test]
async fn anonymous_profile_request_is_unauthenticated() {
    let harness = harness().await;
    let result = access::access_profile_handler(
        State(harness.state),
        Extension(RequestPrincipal::default()),
    )
    .await;

    assert!(matches!(
        result.map_err(status_of),
        Err(StatusCode::UNAUTHORIZED)
    ));
}

#[tokio::test]
async fn profile_lists_roles_and_capabilities() {
    let harness = harness().await;
    let profile = access::access_profile_handler(State(harness.state), caller(DEV_SEED_ADMIN_ID))
        .await
        .unwrap_or_else(|error| panic!("profile should load: {error:?}"));

    assert_eq!(profile.0.roles, vec!["admin"]);
    assert_eq!(
        profile.0.capabilities,
        vec!["role:admin", "role:manager_or_above"]
    );
    assert!(profile.0.permissions.iter().any(|code| code == "SYSTEM.MANAGE"));
}

#[tokio::test]
async fn evidence_moves_from_assignment_to_approval() {
    let harness = harness().await;
    let state = harness.state;
    let evidence_id = harness.evidence_id.to_string();

    let assigned = evidences::assign_evidence_handler(
        State(state.clone()),
        caller(DEV_SEED_MANAGER_ID),
        Path(evidence_id.clone()),
        Json(AssignEvidenceRequest {
            principal_ids: vec![DEV_SEED_EXPERT_ID.to_owned()],
        }),
    )
    .await
    .unwrap_or_else(|error| panic!("manager should assign: {error:?}"));
    assert_eq!(assigned.0.assigned_to, vec![DEV_SEED_EXPERT_ID.to_owned()]);

    let uploaded = evidences::upload_evidence_file_handler(
        State(state.clone()),
        caller(DEV_SEED_EXPERT_ID),
        Path(evidence_id.clone()),
        Json(UploadFileRequest {
            file_name: "curriculum-2024.pdf".to_owned(),
        }),
    )
    .await
    .unwrap_or_else(|error| panic!("expert should upload: {error:?}"));
    assert_eq!(uploaded.0.evidence.status, "in_progress");

    let submitted = evidences::submit_evidence_handler(
        State(state.clone()),
        caller(DEV_SEED_EXPERT_ID),
        Path(evidence_id.clone()),
    )
    .await
    .unwrap_or_else(|error| panic!("expert should submit: {error:?}"));
    assert!(submitted.0.needs_decision);

    let self_approval = evidences::approve_evidence_handler(
        State(state.clone()),
        caller(DEV_SEED_EXPERT_ID),
        Path(evidence_id.clone()),
        Json(ApproveEvidenceRequest::default()),
    )
    .await;
    assert!(matches!(
        self_approval.map_err(status_of),
        Err(StatusCode::FORBIDDEN)
    ));

    let approved = evidences::approve_evidence_handler(
        State(state),
        caller(DEV_SEED_MANAGER_ID),
        Path(evidence_id),
        Json(ApproveEvidenceRequest::default()),
    )
    .await
    .unwrap_or_else(|error| panic!("manager should approve: {error:?}"));
    assert_eq!(approved.0.evidence.status, "approved");
    assert_eq!(approved.0.decided, vec![uploaded.0.file_id]);
}

#[tokio::test]
async fn rejection_without_reason_is_a_bad_request() {
    let harness = harness().await;
    let result = evidences::reject_evidence_handler(
        State(harness.state),
        caller(DEV_SEED_MANAGER_ID),
        Path(harness.evidence_id.to_string()),
        Json(RejectEvidenceRequest {
            file_ids: Vec::new(),
            reason: "   ".to_owned(),
        }),
    )
    .await;

    assert!(matches!(
        result.map_err(status_of),
        Err(StatusCode::BAD_REQUEST)
    ));
}

#[tokio::test]
async fn malformed_path_identifier_is_a_bad_request() {
    let harness = harness().await;
    let result = evidences::get_evidence_handler(
        State(harness.state),
        caller(DEV_SEED_MANAGER_ID),
        Path("H2.01.01.01".to_owned()),
    )
    .await;

    assert!(matches!(
        result.map_err(status_of),
        Err(StatusCode::BAD_REQUEST)
    ));
}

#[tokio::test]
async fn deny_override_revokes_access_through_the_api() {
    let harness = harness().await;
    let state = harness.state;

    let updated = security::set_override_handler(
        State(state.clone()),
        caller(DEV_SEED_ADMIN_ID),
        Path(DEV_SEED_MANAGER_ID.to_owned()),
        Json(SetOverrideRequest {
            permission: "evidences.read".to_owned(),
            kind: "denied".to_owned(),
        }),
    )
    .await
    .unwrap_or_else(|error| panic!("admin should set override: {error:?}"));
    assert_eq!(updated.0.overrides.len(), 1);
    assert_eq!(updated.0.overrides[0].kind, "denied");

    let view = evidences::get_evidence_handler(
        State(state),
        caller(DEV_SEED_MANAGER_ID),
        Path(harness.evidence_id.to_string()),
    )
    .await;
    assert!(matches!(
        view.map_err(status_of),
        Err(StatusCode::FORBIDDEN)
    ));
}
