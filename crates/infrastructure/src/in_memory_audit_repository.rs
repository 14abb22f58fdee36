use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evidentia_application::{AuditEvent, AuditRepository};
use evidentia_core::AppResult;
use tokio::sync::RwLock;

/// Audit event as recorded, with the time it was appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAuditEvent {
    /// Event payload.
    pub event: AuditEvent,
    /// Append timestamp.
    pub recorded_at: DateTime<Utc>,
}

/// Append-only audit log kept in process memory.
///
/// Every event is also emitted as a structured `tracing` record so the
/// log survives in the process output.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<RecordedAuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded events, oldest first.
    pub async fn events(&self) -> Vec<RecordedAuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        tracing::info!(
            subject = %event.subject,
            action = event.action.as_str(),
            resource_type = %event.resource_type,
            resource_id = %event.resource_id,
            detail = event.detail.as_deref(),
            "audit event"
        );

        self.events.write().await.push(RecordedAuditEvent {
            event,
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}
