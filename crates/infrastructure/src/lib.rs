//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_evidence_repository;
mod in_memory_permission_repository;
mod in_memory_principal_repository;

pub use in_memory_audit_repository::{InMemoryAuditRepository, RecordedAuditEvent};
pub use in_memory_evidence_repository::InMemoryEvidenceRepository;
pub use in_memory_permission_repository::InMemoryPermissionRepository;
pub use in_memory_principal_repository::InMemoryPrincipalRepository;
