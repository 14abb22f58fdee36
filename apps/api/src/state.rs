use std::sync::Arc;

use evidentia_application::{
    AccessGuard, AssignmentRegistry, EvidenceLifecycle, PermissionAdminService, WriteRetryPolicy,
};
use evidentia_infrastructure::{
    InMemoryAuditRepository, InMemoryEvidenceRepository, InMemoryPermissionRepository,
    InMemoryPrincipalRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_guard: AccessGuard,
    pub assignment_registry: AssignmentRegistry,
    pub evidence_lifecycle: EvidenceLifecycle,
    pub permission_admin_service: PermissionAdminService,
}

/// Concrete adapters behind every application port.
#[derive(Clone, Default)]
pub struct Repositories {
    pub principals: Arc<InMemoryPrincipalRepository>,
    pub permissions: Arc<InMemoryPermissionRepository>,
    pub evidence: Arc<InMemoryEvidenceRepository>,
    pub audit: Arc<InMemoryAuditRepository>,
}

pub fn build_app_state(repositories: &Repositories, retry_policy: WriteRetryPolicy) -> AppState {
    let access_guard = AccessGuard::new(
        repositories.principals.clone(),
        repositories.permissions.clone(),
        repositories.permissions.clone(),
    );

    AppState {
        assignment_registry: AssignmentRegistry::new(
            access_guard.clone(),
            repositories.principals.clone(),
            repositories.evidence.clone(),
            repositories.audit.clone(),
            retry_policy,
        ),
        evidence_lifecycle: EvidenceLifecycle::new(
            access_guard.clone(),
            repositories.evidence.clone(),
            repositories.audit.clone(),
            retry_policy,
        ),
        permission_admin_service: PermissionAdminService::new(
            access_guard.clone(),
            repositories.principals.clone(),
            repositories.permissions.clone(),
            repositories.permissions.clone(),
            repositories.audit.clone(),
            retry_policy,
        ),
        access_guard,
    }
}
