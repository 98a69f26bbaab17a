use folio_types::{BranchId, CommitId, IntentId, RevisionId};

/// Errors from commit store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("branch not found: {0}")]
    BranchNotFound(BranchId),

    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    /// The revision does not exist, or belongs to another branch.
    #[error("revision not found: {0}")]
    RevisionNotFound(RevisionId),

    #[error("rollback intent not found: {0}")]
    IntentNotFound(IntentId),

    /// The named parent is missing or lives on another branch.
    #[error("parent commit {parent} is not part of branch {branch}")]
    ParentNotInBranch { parent: CommitId, branch: BranchId },

    /// The caller's parent is no longer the branch head.
    #[error("stale parent for branch {branch}: expected head {expected:?}, got {actual:?}")]
    StaleParent {
        branch: BranchId,
        expected: Option<CommitId>,
        actual: Option<CommitId>,
    },

    /// A unique constraint rejected the write.
    #[error("unique constraint violated on {table}: {key}")]
    UniqueViolation { table: &'static str, key: String },

    /// The backing store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
