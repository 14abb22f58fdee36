use std::collections::HashMap;

use async_trait::async_trait;
use evidentia_application::EvidenceRepository;
use evidentia_core::{AppError, AppResult};
use evidentia_domain::{Evidence, EvidenceId};
use tokio::sync::RwLock;

/// In-memory evidence store with optimistic version checks.
#[derive(Debug, Default)]
pub struct InMemoryEvidenceRepository {
    evidence: RwLock<HashMap<EvidenceId, Evidence>>,
}

impl InMemoryEvidenceRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvidenceRepository for InMemoryEvidenceRepository {
    async fn find_evidence(&self, evidence_id: EvidenceId) -> AppResult<Option<Evidence>> {
        Ok(self.evidence.read().await.get(&evidence_id).cloned())
    }

    async fn save_evidence(&self, mut evidence: Evidence) -> AppResult<Evidence> {
        let mut stored = self.evidence.write().await;
        let stored_version = stored.get(&evidence.id()).map_or(0, Evidence::version);

        if stored_version != evidence.version() {
            return Err(AppError::Conflict(format!(
                "evidence '{}' was modified concurrently (expected version {}, found {})",
                evidence.id(),
                evidence.version(),
                stored_version
            )));
        }

        evidence.set_version(stored_version + 1);
        stored.insert(evidence.id(), evidence.clone());
        Ok(evidence)
    }
}
