use evidentia_application::{
    EvidenceRepository, PermissionCatalogRepository, PermissionGroupRepository,
    PrincipalRepository,
};
use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::{
    DepartmentId, Evidence, GroupMembership, Principal, Role, Roles, default_groups,
};
use tracing::info;

use crate::state::Repositories;

pub(crate) const DEV_SEED_DEPARTMENT_ID: &str = "5b0f8d0e-2c61-4a8e-9d5c-0d6f3c1a7e21";

pub(crate) const DEV_SEED_ADMIN_ID: &str = "a2c8ea5f-4f39-4724-97f5-932f97f54f76";
pub(crate) const DEV_SEED_MANAGER_ID: &str = "3f6a1c2d-8e4b-4b7a-a1d9-6c2e5f8b9a10";
pub(crate) const DEV_SEED_EXPERT_ID: &str = "96d11e90-7403-4654-9727-cb1043f8bd31";
pub(crate) const DEV_SEED_ADVISOR_ID: &str = "c41e7a55-0b2f-4d3e-8f6a-7b9d2e1c4a38";

struct SeedPrincipal {
    id: &'static str,
    display_name: &'static str,
    role: Role,
    group_code: &'static str,
    in_department: bool,
}

const SEED_PRINCIPALS: [SeedPrincipal; 4] = [
    SeedPrincipal {
        id: DEV_SEED_ADMIN_ID,
        display_name: "System Administrator",
        role: Role::Admin,
        group_code: "SUPER_ADMIN",
        in_department: false,
    },
    SeedPrincipal {
        id: DEV_SEED_MANAGER_ID,
        display_name: "Quality Manager",
        role: Role::Manager,
        group_code: "REPORT_MANAGER",
        in_department: true,
    },
    SeedPrincipal {
        id: DEV_SEED_EXPERT_ID,
        display_name: "Evaluation Expert",
        role: Role::Expert,
        group_code: "EVALUATION_EXPERT",
        in_department: true,
    },
    SeedPrincipal {
        id: DEV_SEED_ADVISOR_ID,
        display_name: "External Advisor",
        role: Role::Advisor,
        group_code: "ADVISOR",
        in_department: false,
    },
];

const SEED_EVIDENCE: [(&str, &str); 2] = [
    ("H1.01.01.01", "Published mission statement"),
    ("H3.02.01.01", "Alumni feedback survey"),
];

/// Loads the system groups, demo principals and evidence items.
pub async fn run(repositories: &Repositories) -> AppResult<()> {
    let department: DepartmentId = DEV_SEED_DEPARTMENT_ID.parse()?;
    let catalog = repositories.permissions.load_catalog().await?;

    let mut groups = Vec::new();
    for group in default_groups(&catalog) {
        groups.push(repositories.permissions.create_group(group).await?);
    }

    for seed in &SEED_PRINCIPALS {
        let principal_id: PrincipalId = seed.id.parse()?;
        let mut principal =
            Principal::new(principal_id, seed.display_name, Roles::new([seed.role]))?;
        if seed.in_department {
            principal = principal.with_department(department);
        }
        repositories.principals.save_principal(principal).await?;

        let group = groups
            .iter()
            .find(|group| group.code() == seed.group_code)
            .ok_or_else(|| {
                AppError::Internal(format!("missing seed group '{}'", seed.group_code))
            })?;
        repositories
            .permissions
            .add_member(GroupMembership {
                principal_id,
                group_id: group.id(),
            })
            .await?;
        info!(%principal_id, group = seed.group_code, "seeded principal");
    }

    for (code, name) in SEED_EVIDENCE {
        let evidence = repositories
            .evidence
            .save_evidence(Evidence::new(code, name, department)?)
            .await?;
        info!(evidence_id = %evidence.id(), code, "seeded evidence item");
    }

    info!(%department, "dev seed completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use evidentia_application::WriteRetryPolicy;
    use evidentia_core::PrincipalId;
    use evidentia_domain::{AccessRequirement, PermissionCode, codes};

    use crate::state::{Repositories, build_app_state};

    use super::{
        DEV_SEED_ADMIN_ID, DEV_SEED_ADVISOR_ID, DEV_SEED_EXPERT_ID, DEV_SEED_MANAGER_ID, run,
    };

    fn principal(value: &str) -> Option<PrincipalId> {
        value.parse().ok()
    }

    #[tokio::test]
    async fn seeded_principals_resolve_to_their_group_access() {
        let repositories = Repositories::default();
        assert!(run(&repositories).await.is_ok());
        let state = build_app_state(&repositories, WriteRetryPolicy::default());

        let approve = AccessRequirement::permission(
            PermissionCode::new(codes::EVIDENCES_APPROVE)
                .unwrap_or_else(|error| panic!("valid code: {error}")),
        );
        for (seed, allowed) in [
            (DEV_SEED_ADMIN_ID, true),
            (DEV_SEED_MANAGER_ID, true),
            (DEV_SEED_EXPERT_ID, false),
            (DEV_SEED_ADVISOR_ID, false),
        ] {
            let decision = state.access_guard.authorize(principal(seed), &approve).await;
            assert_eq!(
                decision.map(|decision| decision.is_allowed()).ok(),
                Some(allowed),
                "unexpected approve decision for {seed}"
            );
        }

        let admin = state
            .access_guard
            .authorize(principal(DEV_SEED_ADMIN_ID), &AccessRequirement::admin())
            .await;
        assert!(admin.is_ok_and(|decision| decision.is_allowed()));
    }
}
