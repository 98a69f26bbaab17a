use std::sync::Arc;

use folio_store::{Database, StoreError, Transaction};
use folio_types::AuditEvent;
use tracing::{debug, warn};

use crate::error::{AuditError, AuditResult};
use crate::traits::AuditLog;

/// [`AuditLog`] storing events in the shared in-memory [`Database`].
#[derive(Clone, Debug)]
pub struct InMemoryAuditLog {
    db: Arc<Database>,
}

impl InMemoryAuditLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append_event(&self, tx: &mut Transaction<'_>, event: AuditEvent) -> AuditResult<()> {
        let dedupe_key = event.dedupe_key.clone();
        let action = event.action.clone();
        match tx.insert_audit_event(event) {
            Ok(()) => {
                debug!(%action, %dedupe_key, "audit event staged");
                Ok(())
            }
            Err(StoreError::UniqueViolation { .. }) => {
                warn!(%action, %dedupe_key, "duplicate audit event ignored");
                Err(AuditError::DuplicateEvent { dedupe_key })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn events(&self, stream_type: &str, stream_key: &str) -> AuditResult<Vec<AuditEvent>> {
        let tables = self.db.read()?;
        Ok(tables
            .audit_events()
            .iter()
            .filter(|e| e.stream_type == stream_type && e.stream_key == stream_key)
            .cloned()
            .collect())
    }

    fn event_count(&self) -> AuditResult<usize> {
        Ok(self.db.read()?.audit_events().len())
    }
}
