//! Application services and ports.

#![forbid(unsafe_code)]

mod access_guard;
mod access_ports;
mod assignment_registry;
mod audit_ports;
mod evidence_lifecycle;
mod evidence_ports;
mod permission_admin_service;
mod write_retry;

#[cfg(test)]
mod test_support;

pub use access_guard::{AccessGuard, AuthorizedPrincipal};
pub use access_ports::{PermissionCatalogRepository, PermissionGroupRepository, PrincipalRepository};
pub use assignment_registry::AssignmentRegistry;
pub use audit_ports::{AuditEvent, AuditRepository};
pub use evidence_lifecycle::{EvidenceDecision, EvidenceLifecycle, EvidenceView, UploadFileInput};
pub use evidence_ports::EvidenceRepository;
pub use permission_admin_service::{CreateGroupInput, PermissionAdminService, UpdateGroupInput};
pub use write_retry::{
    DEFAULT_MAX_WRITE_ATTEMPTS, MAX_WRITE_ATTEMPTS_LIMIT, WriteRetryPolicy, retry_on_conflict,
};
