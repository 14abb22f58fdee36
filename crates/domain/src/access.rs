use std::fmt::{Display, Formatter};

use evidentia_core::AppError;
use serde::{Deserialize, Serialize};

use crate::{
    EffectivePermissions, PermissionAction, PermissionCode, PermissionModule, RoleCapability,
};

/// A condition a principal must satisfy to perform an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessRequirement {
    /// A single permission code.
    Permission {
        /// Required code.
        code: PermissionCode,
    },
    /// Every listed code. An empty list is always satisfied.
    AllOf {
        /// Required codes.
        codes: Vec<PermissionCode>,
    },
    /// At least one listed code. An empty list is never satisfied.
    AnyOf {
        /// Candidate codes.
        codes: Vec<PermissionCode>,
    },
    /// Some permission of a module, optionally restricted to one action.
    Module {
        /// Required module.
        module: PermissionModule,
        /// Optional required action.
        action: Option<PermissionAction>,
    },
    /// Legacy coarse role check, evaluated as a derived capability.
    Role {
        /// Required capability.
        capability: RoleCapability,
    },
}

impl AccessRequirement {
    /// Requires one permission code.
    #[must_use]
    pub fn permission(code: PermissionCode) -> Self {
        Self::Permission { code }
    }

    /// Requires the legacy admin role.
    #[must_use]
    pub fn admin() -> Self {
        Self::Role {
            capability: RoleCapability::Admin,
        }
    }

    /// Requires the legacy manager-or-above role.
    #[must_use]
    pub fn manager_or_above() -> Self {
        Self::Role {
            capability: RoleCapability::ManagerOrAbove,
        }
    }

    /// Returns whether `effective` satisfies this requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, effective: &EffectivePermissions) -> bool {
        match self {
            Self::Permission { code } => effective.contains(code),
            Self::AllOf { codes } => codes.iter().all(|code| effective.contains(code)),
            Self::AnyOf { codes } => codes.iter().any(|code| effective.contains(code)),
            Self::Module { module, action } => effective.has_module_permission(*module, *action),
            Self::Role { capability } => effective.has_capability(*capability),
        }
    }
}

impl Display for AccessRequirement {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let join = |codes: &[PermissionCode]| {
            codes
                .iter()
                .map(PermissionCode::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        match self {
            Self::Permission { code } => write!(formatter, "{code}"),
            Self::AllOf { codes } => write!(formatter, "all of [{}]", join(codes)),
            Self::AnyOf { codes } => write!(formatter, "any of [{}]", join(codes)),
            Self::Module {
                module,
                action: Some(action),
            } => write!(formatter, "module {}:{}", module.as_str(), action.as_str()),
            Self::Module {
                module,
                action: None,
            } => write!(formatter, "module {}", module.as_str()),
            Self::Role { capability } => formatter.write_str(capability.as_str()),
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No active principal accompanies the request.
    Unauthenticated,
    /// The principal does not satisfy the requirement.
    Forbidden(AccessRequirement),
}

/// Outcome of an authorization check. A denial is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The requirement is satisfied.
    Allow,
    /// The requirement is not satisfied.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Returns whether access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts a denial into the matching error.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(DenyReason::Unauthenticated) => Err(AppError::Unauthenticated),
            Self::Deny(DenyReason::Forbidden(requirement)) => Err(AppError::Forbidden {
                requirement: requirement.to_string(),
            }),
        }
    }
}

/// The single access decision function.
///
/// `None` means there is no authenticated, active principal.
#[must_use]
pub fn decide(
    effective: Option<&EffectivePermissions>,
    requirement: &AccessRequirement,
) -> AccessDecision {
    match effective {
        None => AccessDecision::Deny(DenyReason::Unauthenticated),
        Some(effective) if requirement.is_satisfied_by(effective) => AccessDecision::Allow,
        Some(_) => AccessDecision::Deny(DenyReason::Forbidden(requirement.clone())),
    }
}

#[cfg(test)]
mod tests {
    use evidentia_core::{AppError, PrincipalId};

    use super::{AccessDecision, AccessRequirement, DenyReason, decide};
    use crate::{
        EffectivePermissions, PermissionCatalog, PermissionCode, PermissionModule,
        PermissionResolver, Principal, PrincipalSnapshot, Role, Roles,
    };

    fn code(value: &str) -> PermissionCode {
        PermissionCode::new(value).unwrap_or_else(|_| panic!("invalid code {value}"))
    }

    fn effective(roles: Roles, selected: &[&str]) -> EffectivePermissions {
        let mut principal = Principal::new(PrincipalId::new(), "Test principal", roles)
            .unwrap_or_else(|_| panic!("valid principal"));
        principal.set_selected_permissions(selected.iter().map(|value| code(value)));
        PermissionResolver::resolve(&PrincipalSnapshot {
            principal,
            groups: Vec::new(),
            catalog: PermissionCatalog::with_defaults(),
        })
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        let decision = decide(None, &AccessRequirement::AllOf { codes: Vec::new() });
        assert_eq!(decision, AccessDecision::Deny(DenyReason::Unauthenticated));
    }

    #[test]
    fn empty_all_of_allows_and_empty_any_of_denies() {
        let effective = effective(Roles::default(), &[]);
        assert!(decide(Some(&effective), &AccessRequirement::AllOf { codes: Vec::new() })
            .is_allowed());
        assert!(!decide(Some(&effective), &AccessRequirement::AnyOf { codes: Vec::new() })
            .is_allowed());
    }

    #[test]
    fn forbidden_echoes_requirement() {
        let effective = effective(Roles::default(), &["REPORTS.READ"]);
        let requirement = AccessRequirement::permission(code("REPORTS.DELETE"));
        let result = decide(Some(&effective), &requirement).into_result();

        assert!(matches!(
            result,
            Err(AppError::Forbidden { ref requirement }) if requirement == "REPORTS.DELETE"
        ));
    }

    #[test]
    fn module_requirement_matches_any_action_when_unspecified() {
        let effective = effective(Roles::default(), &["EVIDENCES.READ"]);
        let requirement = AccessRequirement::Module {
            module: PermissionModule::Evidences,
            action: None,
        };
        assert!(decide(Some(&effective), &requirement).is_allowed());
    }

    #[test]
    fn legacy_role_checks_use_same_decision_function() {
        let admin = effective(Roles::new([Role::Admin]), &[]);
        let expert = effective(Roles::new([Role::Expert, Role::Admin]), &[]);

        assert!(decide(Some(&admin), &AccessRequirement::admin()).is_allowed());
        assert!(decide(Some(&admin), &AccessRequirement::manager_or_above()).is_allowed());
        assert!(!decide(Some(&expert), &AccessRequirement::manager_or_above()).is_allowed());
        assert_eq!(
            AccessRequirement::manager_or_above().to_string(),
            "role:manager_or_above"
        );
    }
}
