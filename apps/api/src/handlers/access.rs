use axum::Json;
use axum::extract::{Extension, State};
use evidentia_core::AppError;
use evidentia_domain::AccessRequirement;

use crate::dto::{AccessCheckResponse, AccessProfileResponse};
use crate::error::ApiResult;
use crate::middleware::RequestPrincipal;
use crate::state::AppState;

pub async fn access_profile_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
) -> ApiResult<Json<AccessProfileResponse>> {
    let authorized = state
        .access_guard
        .resolve_actor(actor)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    Ok(Json(AccessProfileResponse::from(authorized)))
}

pub async fn access_check_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Json(requirement): Json<AccessRequirement>,
) -> ApiResult<Json<AccessCheckResponse>> {
    let decision = state.access_guard.authorize(actor, &requirement).await?;

    Ok(Json(AccessCheckResponse {
        allowed: decision.is_allowed(),
        requirement: requirement.to_string(),
    }))
}
