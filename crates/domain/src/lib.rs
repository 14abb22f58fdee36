//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod catalog;
mod evidence;
mod group;
mod ids;
mod permission;
mod principal;
mod resolver;
mod security;

pub use access::{AccessDecision, AccessRequirement, DenyReason, decide};
pub use catalog::PermissionCatalog;
pub use evidence::{
    DecisionOutcome, DisplayStatus, Evidence, EvidenceFile, EvidenceStatus, FileApprovalStatus,
};
pub use group::{GROUP_PRIORITY_MAX, GroupKind, GroupMembership, PermissionGroup, default_groups};
pub use ids::{DepartmentId, EvidenceId, FileId, GroupId};
pub use permission::{
    Permission, PermissionAction, PermissionCode, PermissionLevel, PermissionModule, codes,
};
pub use principal::{
    OverrideKind, PermissionOverride, Principal, PrincipalStatus, Role, Roles,
};
pub use resolver::{EffectivePermissions, PermissionResolver, PrincipalSnapshot, RoleCapability};
pub use security::AuditAction;
