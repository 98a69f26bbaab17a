use folio_audit::AuditError;
use folio_store::StoreError;
use folio_types::{BranchId, CommitId, IntentId, RevisionId};

/// Errors from rollback operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RollbackError {
    #[error("branch not found: {0}")]
    BranchNotFound(BranchId),

    /// The target commit is missing or belongs to another branch.
    #[error("commit {commit} not found in branch {branch}")]
    CommitNotFound { branch: BranchId, commit: CommitId },

    /// The target commit has no readable revision to restore.
    #[error("commit {0} has no linked revision")]
    MissingRevision(CommitId),

    /// The target commit links a revision that does not exist.
    #[error("revision not found: {0}")]
    RevisionNotFound(RevisionId),

    #[error("rollback intent not found: {0}")]
    IntentNotFound(IntentId),

    /// Another caller holds the intent and is creating its revision.
    #[error("rollback intent {0} is already in progress")]
    IntentInProgress(IntentId),

    /// The rollback was audited, but creating the new revision failed. The
    /// intent stays pending and can be completed later.
    #[error("revision creation failed for rollback intent {intent_id}: {reason}")]
    DownstreamFailure { intent_id: IntentId, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
}

/// Result alias for rollback operations.
pub type RollbackResult<T> = Result<T, RollbackError>;
