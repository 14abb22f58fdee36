use std::collections::HashMap;

use async_trait::async_trait;
use evidentia_application::PrincipalRepository;
use evidentia_core::{AppError, AppResult, PrincipalId};
use evidentia_domain::Principal;
use tokio::sync::RwLock;

/// In-memory principal store with optimistic version checks.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalRepository {
    principals: RwLock<HashMap<PrincipalId, Principal>>,
}

impl InMemoryPrincipalRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self.principals.read().await.get(&principal_id).cloned())
    }

    async fn save_principal(&self, mut principal: Principal) -> AppResult<Principal> {
        let mut principals = self.principals.write().await;
        let stored_version = principals
            .get(&principal.id())
            .map_or(0, Principal::version);

        if stored_version != principal.version() {
            return Err(AppError::Conflict(format!(
                "principal '{}' was modified concurrently (expected version {}, found {})",
                principal.id(),
                principal.version(),
                stored_version
            )));
        }

        principal.set_version(stored_version + 1);
        principals.insert(principal.id(), principal.clone());
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use evidentia_application::PrincipalRepository;
    use evidentia_core::{AppError, PrincipalId};
    use evidentia_domain::{Principal, PrincipalStatus, Roles};

    use super::InMemoryPrincipalRepository;

    fn principal() -> Principal {
        Principal::new(PrincipalId::new(), "Minh", Roles::default())
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn save_bumps_version() {
        let repository = InMemoryPrincipalRepository::new();
        let saved = repository.save_principal(principal()).await;
        assert_eq!(saved.map(|principal| principal.version()).ok(), Some(1));
    }

    #[tokio::test]
    async fn stale_save_is_a_conflict() {
        let repository = InMemoryPrincipalRepository::new();
        let first = repository
            .save_principal(principal())
            .await
            .unwrap_or_else(|_| unreachable!());

        let mut left = first.clone();
        left.set_status(PrincipalStatus::Suspended);
        let mut right = first;
        right.set_status(PrincipalStatus::Inactive);

        assert!(repository.save_principal(left).await.is_ok());
        assert!(matches!(
            repository.save_principal(right).await,
            Err(AppError::Conflict(_))
        ));
    }
}
