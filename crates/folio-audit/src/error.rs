use folio_store::StoreError;

/// Errors from audit log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// An event with this dedupe key already exists. Callers retrying a
    /// request treat this as success.
    #[error("duplicate audit event: {dedupe_key}")]
    DuplicateEvent { dedupe_key: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
