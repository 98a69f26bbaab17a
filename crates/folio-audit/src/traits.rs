use folio_store::Transaction;
use folio_types::AuditEvent;

use crate::error::AuditResult;

/// Append-only audit sink.
///
/// Writes participate in a caller-supplied [`Transaction`] so an audit event
/// commits or aborts together with the caller's other writes. There is no
/// implicit or ambient transaction.
pub trait AuditLog: Send + Sync {
    /// Stage `event` in `tx`.
    ///
    /// Fails with [`AuditError::DuplicateEvent`](crate::AuditError::DuplicateEvent)
    /// if an event with the same dedupe key is already stored or staged; the
    /// transaction stays usable.
    fn append_event(&self, tx: &mut Transaction<'_>, event: AuditEvent) -> AuditResult<()>;

    /// Committed events of one stream, in append order.
    fn events(&self, stream_type: &str, stream_key: &str) -> AuditResult<Vec<AuditEvent>>;

    /// Number of committed events across all streams.
    fn event_count(&self) -> AuditResult<usize>;
}
