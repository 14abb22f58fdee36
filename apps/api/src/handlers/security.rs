use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use evidentia_application::{CreateGroupInput, UpdateGroupInput};
use evidentia_domain::OverrideKind;

use crate::dto::{
    AddGroupMemberRequest, CreateGroupRequest, GroupResponse, PrincipalPermissionsResponse,
    ReplaceSelectedPermissionsRequest, SetOverrideRequest, UpdateGroupRequest,
};
use crate::error::ApiResult;
use crate::middleware::RequestPrincipal;
use crate::state::AppState;

pub async fn create_group_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Json(payload): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    let group = state
        .permission_admin_service
        .create_group(
            actor,
            CreateGroupInput {
                code: payload.code,
                name: payload.name,
                priority: payload.priority,
                permissions: payload.permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

pub async fn update_group_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(group_id): Path<String>,
    Json(payload): Json<UpdateGroupRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let group = state
        .permission_admin_service
        .update_group(
            actor,
            group_id.parse()?,
            UpdateGroupInput {
                add: payload.add,
                remove: payload.remove,
                active: payload.active,
            },
        )
        .await?;

    Ok(Json(GroupResponse::from(group)))
}

pub async fn delete_group_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(group_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .permission_admin_service
        .delete_group(actor, group_id.parse()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_group_members_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let members = state
        .permission_admin_service
        .list_members(actor, group_id.parse()?)
        .await?
        .into_iter()
        .map(|principal| principal.to_string())
        .collect();

    Ok(Json(members))
}

pub async fn add_group_member_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(group_id): Path<String>,
    Json(payload): Json<AddGroupMemberRequest>,
) -> ApiResult<StatusCode> {
    state
        .permission_admin_service
        .add_member(actor, group_id.parse()?, payload.principal_id.parse()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_group_member_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path((group_id, principal_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .permission_admin_service
        .remove_member(actor, group_id.parse()?, principal_id.parse()?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_override_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(principal_id): Path<String>,
    Json(payload): Json<SetOverrideRequest>,
) -> ApiResult<Json<PrincipalPermissionsResponse>> {
    let kind: OverrideKind = payload.kind.parse()?;
    let principal = state
        .permission_admin_service
        .set_override(actor, principal_id.parse()?, &payload.permission, kind)
        .await?;

    Ok(Json(PrincipalPermissionsResponse::from(principal)))
}

pub async fn clear_override_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path((principal_id, code)): Path<(String, String)>,
) -> ApiResult<Json<PrincipalPermissionsResponse>> {
    let principal = state
        .permission_admin_service
        .clear_override(actor, principal_id.parse()?, &code)
        .await?;

    Ok(Json(PrincipalPermissionsResponse::from(principal)))
}

pub async fn replace_selected_permissions_handler(
    State(state): State<AppState>,
    Extension(RequestPrincipal(actor)): Extension<RequestPrincipal>,
    Path(principal_id): Path<String>,
    Json(payload): Json<ReplaceSelectedPermissionsRequest>,
) -> ApiResult<Json<PrincipalPermissionsResponse>> {
    let principal = state
        .permission_admin_service
        .replace_selected_permissions(actor, principal_id.parse()?, &payload.permissions)
        .await?;

    Ok(Json(PrincipalPermissionsResponse::from(principal)))
}
