use async_trait::async_trait;

use evidentia_core::{AppError, AppResult};
use evidentia_domain::{Evidence, EvidenceId};

/// Repository port for evidence items with their file metadata.
#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    /// Finds an evidence item with files populated.
    async fn find_evidence(&self, evidence_id: EvidenceId) -> AppResult<Option<Evidence>>;

    /// Saves an evidence item loaded at `evidence.version()`.
    ///
    /// Returns the stored item with its new version, or
    /// `AppError::Conflict` when another writer saved first.
    async fn save_evidence(&self, evidence: Evidence) -> AppResult<Evidence>;
}

/// Loads an evidence item or fails with `NotFound`.
pub(crate) async fn require_evidence(
    repository: &dyn EvidenceRepository,
    evidence_id: EvidenceId,
) -> AppResult<Evidence> {
    repository
        .find_evidence(evidence_id)
        .await?
        .ok_or_else(|| AppError::not_found("evidence", evidence_id))
}
