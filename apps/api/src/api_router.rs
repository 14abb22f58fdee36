use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/access/me", get(handlers::access::access_profile_handler))
        .route("/api/access/check", post(handlers::access::access_check_handler))
        .route(
            "/api/evidences/{evidence_id}",
            get(handlers::evidences::get_evidence_handler),
        )
        .route(
            "/api/evidences/{evidence_id}/assignments",
            post(handlers::evidences::assign_evidence_handler),
        )
        .route(
            "/api/evidences/{evidence_id}/assignments/{principal_id}",
            delete(handlers::evidences::unassign_evidence_handler),
        )
        .route(
            "/api/evidences/{evidence_id}/files",
            post(handlers::evidences::upload_evidence_file_handler),
        )
        .route(
            "/api/evidences/{evidence_id}/submit",
            post(handlers::evidences::submit_evidence_handler),
        )
        .route(
            "/api/evidences/{evidence_id}/approve",
            post(handlers::evidences::approve_evidence_handler),
        )
        .route(
            "/api/evidences/{evidence_id}/reject",
            post(handlers::evidences::reject_evidence_handler),
        )
        .route(
            "/api/security/groups",
            post(handlers::security::create_group_handler),
        )
        .route(
            "/api/security/groups/{group_id}",
            delete(handlers::security::delete_group_handler),
        )
        .route(
            "/api/security/groups/{group_id}/permissions",
            put(handlers::security::update_group_handler),
        )
        .route(
            "/api/security/groups/{group_id}/members",
            get(handlers::security::list_group_members_handler)
                .post(handlers::security::add_group_member_handler),
        )
        .route(
            "/api/security/groups/{group_id}/members/{principal_id}",
            delete(handlers::security::remove_group_member_handler),
        )
        .route(
            "/api/security/principals/{principal_id}/overrides",
            put(handlers::security::set_override_handler),
        )
        .route(
            "/api/security/principals/{principal_id}/overrides/{code}",
            delete(handlers::security::clear_override_handler),
        )
        .route(
            "/api/security/principals/{principal_id}/selected-permissions",
            put(handlers::security::replace_selected_permissions_handler),
        )
        .layer(from_fn(middleware::resolve_principal));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
