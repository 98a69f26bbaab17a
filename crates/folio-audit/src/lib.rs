//! Append-only audit log for Folio.
//!
//! Events are written inside the caller's store transaction and are unique
//! by dedupe key: a retried request produces
//! [`AuditError::DuplicateEvent`], which callers treat as an idempotent
//! success rather than a failure.

pub mod error;
pub mod event;
pub mod memory;
pub mod traits;

pub use error::{AuditError, AuditResult};
pub use event::{
    rollback_dedupe_key, rollback_requested, AuditEventBuilder, BRANCH_STREAM, ROLLBACK_REQUESTED,
};
pub use memory::InMemoryAuditLog;
pub use traits::AuditLog;
