use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::{
    AuditAction, DepartmentId, Evidence, EvidenceId, GroupId, GroupMembership, PermissionCatalog,
    PermissionCode, PermissionGroup, Principal, Roles,
};

use crate::{
    AccessGuard, AuditEvent, AuditRepository, EvidenceRepository, PermissionCatalogRepository,
    PermissionGroupRepository, PrincipalRepository,
};

pub(crate) fn principal(roles: Roles) -> Principal {
    Principal::new(PrincipalId::new(), "Test principal", roles)
        .unwrap_or_else(|_| panic!("valid principal"))
}

pub(crate) fn principal_in(department: DepartmentId, roles: Roles) -> Principal {
    principal(roles).with_department(department)
}

#[derive(Default)]
pub(crate) struct FakePrincipalRepository {
    principals: Mutex<HashMap<PrincipalId, Principal>>,
    conflicts_to_inject: Mutex<u8>,
}

#[async_trait]
impl PrincipalRepository for FakePrincipalRepository {
    async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self.principals.lock().await.get(&principal_id).cloned())
    }

    async fn save_principal(&self, mut principal: Principal) -> AppResult<Principal> {
        let mut conflicts = self.conflicts_to_inject.lock().await;
        if *conflicts > 0 {
            *conflicts -= 1;
            return Err(AppError::Conflict("injected".to_owned()));
        }

        let mut principals = self.principals.lock().await;
        let stored_version = principals
            .get(&principal.id())
            .map(Principal::version)
            .unwrap_or_default();
        if stored_version != principal.version() {
            return Err(AppError::Conflict(format!(
                "principal '{}' changed",
                principal.id()
            )));
        }
        principal.set_version(stored_version + 1);
        principals.insert(principal.id(), principal.clone());
        Ok(principal)
    }
}

#[derive(Default)]
pub(crate) struct FakeCatalogRepository {
    unavailable: Mutex<bool>,
}

#[async_trait]
impl PermissionCatalogRepository for FakeCatalogRepository {
    async fn load_catalog(&self) -> AppResult<PermissionCatalog> {
        if *self.unavailable.lock().await {
            return Err(AppError::Unavailable("catalog store offline".to_owned()));
        }
        Ok(PermissionCatalog::with_defaults())
    }
}

#[derive(Default)]
pub(crate) struct FakeGroupRepository {
    groups: Mutex<HashMap<GroupId, PermissionGroup>>,
    memberships: Mutex<BTreeSet<GroupMembership>>,
}

impl FakeGroupRepository {
    async fn update(
        &self,
        group_id: GroupId,
        apply: impl FnOnce(&mut PermissionGroup),
    ) -> AppResult<PermissionGroup> {
        let mut groups = self.groups.lock().await;
        let group = groups
            .get_mut(&group_id)
            .ok_or_else(|| AppError::not_found("group", group_id))?;
        apply(group);
        Ok(group.clone())
    }
}

#[async_trait]
impl PermissionGroupRepository for FakeGroupRepository {
    async fn find_group(&self, group_id: GroupId) -> AppResult<Option<PermissionGroup>> {
        Ok(self.groups.lock().await.get(&group_id).cloned())
    }

    async fn create_group(&self, group: PermissionGroup) -> AppResult<PermissionGroup> {
        let mut groups = self.groups.lock().await;
        if groups.values().any(|stored| stored.code() == group.code()) {
            return Err(AppError::Conflict(format!(
                "group code '{}' already exists",
                group.code()
            )));
        }
        groups.insert(group.id(), group.clone());
        Ok(group)
    }

    async fn delete_group(&self, group_id: GroupId) -> AppResult<()> {
        self.groups.lock().await.remove(&group_id);
        self.memberships
            .lock()
            .await
            .retain(|membership| membership.group_id != group_id);
        Ok(())
    }

    async fn add_group_permissions(
        &self,
        group_id: GroupId,
        codes: Vec<PermissionCode>,
    ) -> AppResult<PermissionGroup> {
        self.update(group_id, |group| {
            group.add_permissions(codes);
        })
        .await
    }

    async fn remove_group_permissions(
        &self,
        group_id: GroupId,
        codes: Vec<PermissionCode>,
    ) -> AppResult<PermissionGroup> {
        self.update(group_id, |group| {
            group.remove_permissions(&codes);
        })
        .await
    }

    async fn set_group_active(
        &self,
        group_id: GroupId,
        active: bool,
    ) -> AppResult<PermissionGroup> {
        self.update(group_id, |group| group.set_active(active)).await
    }

    async fn add_member(&self, membership: GroupMembership) -> AppResult<bool> {
        Ok(self.memberships.lock().await.insert(membership))
    }

    async fn remove_member(&self, membership: GroupMembership) -> AppResult<bool> {
        Ok(self.memberships.lock().await.remove(&membership))
    }

    async fn list_groups_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionGroup>> {
        let memberships = self.memberships.lock().await;
        let groups = self.groups.lock().await;
        Ok(memberships
            .iter()
            .filter(|membership| membership.principal_id == principal_id)
            .filter_map(|membership| groups.get(&membership.group_id).cloned())
            .collect())
    }

    async fn list_members(&self, group_id: GroupId) -> AppResult<Vec<PrincipalId>> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .filter(|membership| membership.group_id == group_id)
            .map(|membership| membership.principal_id)
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeEvidenceRepository {
    evidence: Mutex<HashMap<EvidenceId, Evidence>>,
    conflicts_to_inject: Mutex<u8>,
}

#[async_trait]
impl EvidenceRepository for FakeEvidenceRepository {
    async fn find_evidence(&self, evidence_id: EvidenceId) -> AppResult<Option<Evidence>> {
        Ok(self.evidence.lock().await.get(&evidence_id).cloned())
    }

    async fn save_evidence(&self, mut evidence: Evidence) -> AppResult<Evidence> {
        let mut conflicts = self.conflicts_to_inject.lock().await;
        if *conflicts > 0 {
            *conflicts -= 1;
            return Err(AppError::Conflict("injected".to_owned()));
        }

        let mut stored = self.evidence.lock().await;
        let stored_version = stored
            .get(&evidence.id())
            .map(Evidence::version)
            .unwrap_or_default();
        if stored_version != evidence.version() {
            return Err(AppError::Conflict(format!(
                "evidence '{}' changed",
                evidence.id()
            )));
        }
        evidence.set_version(stored_version + 1);
        stored.insert(evidence.id(), evidence.clone());
        Ok(evidence)
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
    unavailable: Mutex<bool>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if *self.unavailable.lock().await {
            return Err(AppError::Unavailable("audit store offline".to_owned()));
        }
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Shared fakes wired the way the API composition root wires real adapters.
#[derive(Default)]
pub(crate) struct Fixture {
    pub(crate) principals: Arc<FakePrincipalRepository>,
    pub(crate) groups: Arc<FakeGroupRepository>,
    pub(crate) catalog: Arc<FakeCatalogRepository>,
    pub(crate) evidence: Arc<FakeEvidenceRepository>,
    pub(crate) audit: Arc<FakeAuditRepository>,
}

impl Fixture {
    pub(crate) fn guard(&self) -> AccessGuard {
        AccessGuard::new(
            self.principals.clone(),
            self.groups.clone(),
            self.catalog.clone(),
        )
    }

    pub(crate) async fn insert_principal(&self, principal: Principal) {
        self.principals
            .principals
            .lock()
            .await
            .insert(principal.id(), principal);
    }

    pub(crate) async fn stored_principal(&self, principal_id: PrincipalId) -> Principal {
        self.principals
            .principals
            .lock()
            .await
            .get(&principal_id)
            .cloned()
            .unwrap_or_else(|| panic!("missing principal {principal_id}"))
    }

    pub(crate) async fn insert_group_with_member(
        &self,
        group: PermissionGroup,
        principal_id: PrincipalId,
    ) -> GroupId {
        let group_id = group.id();
        self.groups.groups.lock().await.insert(group_id, group);
        self.groups.memberships.lock().await.insert(GroupMembership {
            principal_id,
            group_id,
        });
        group_id
    }

    /// Stores a principal holding `codes` through a dedicated group.
    pub(crate) async fn insert_principal_with(
        &self,
        principal: Principal,
        codes: &[&str],
    ) -> PrincipalId {
        let principal_id = principal.id();
        self.insert_principal(principal).await;
        let mut group = PermissionGroup::new(&format!("GRANTS_{principal_id}"), "Grants", 10)
            .unwrap_or_else(|_| panic!("valid group"));
        group.add_permissions(codes.iter().map(|value| {
            PermissionCode::new(value).unwrap_or_else(|_| panic!("invalid code {value}"))
        }));
        self.insert_group_with_member(group, principal_id).await;
        principal_id
    }

    pub(crate) async fn insert_evidence(&self, evidence: Evidence) -> EvidenceId {
        let evidence_id = evidence.id();
        self.evidence
            .evidence
            .lock()
            .await
            .insert(evidence_id, evidence);
        evidence_id
    }

    pub(crate) async fn stored_evidence(&self, evidence_id: EvidenceId) -> Evidence {
        self.evidence
            .evidence
            .lock()
            .await
            .get(&evidence_id)
            .cloned()
            .unwrap_or_else(|| panic!("missing evidence {evidence_id}"))
    }

    pub(crate) async fn fail_catalog_loads(&self) {
        *self.catalog.unavailable.lock().await = true;
    }

    pub(crate) async fn fail_audit_appends(&self) {
        *self.audit.unavailable.lock().await = true;
    }

    pub(crate) async fn inject_evidence_conflicts(&self, count: u8) {
        *self.evidence.conflicts_to_inject.lock().await = count;
    }

    pub(crate) async fn inject_principal_conflicts(&self, count: u8) {
        *self.principals.conflicts_to_inject.lock().await = count;
    }

    pub(crate) async fn audit_actions(&self) -> Vec<AuditAction> {
        self.audit
            .events
            .lock()
            .await
            .iter()
            .map(|event| event.action)
            .collect()
    }

    pub(crate) async fn audit_details(&self) -> Vec<String> {
        self.audit
            .events
            .lock()
            .await
            .iter()
            .filter_map(|event| event.detail.clone())
            .collect()
    }
}
