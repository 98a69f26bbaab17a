use std::collections::BTreeSet;

use folio_types::{
    Branch, BranchId, Commit, CommitId, Content, IntentId, Revision, RevisionId, RollbackIntent,
};

use crate::database::Transaction;
use crate::error::StoreResult;

/// One page of a branch's history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPage {
    /// Newest first: `createdAt` descending, then id descending.
    pub commits: Vec<Commit>,
    /// Number of commits on the branch, independent of the page window.
    pub total: u64,
}

/// Persisted, per-branch append-only commit chain.
///
/// Implementations must uphold:
/// - commits and revisions are never mutated or deleted
/// - a commit's parent exists in the same branch and was the head when the
///   commit was appended
/// - all reads are safe to run concurrently with writers
pub trait CommitStore: Send + Sync {
    /// Open an exclusive write transaction on the backing database.
    fn begin(&self) -> StoreResult<Transaction<'_>>;

    /// Create an empty branch for a manuscript.
    fn create_branch(&self, manuscript_id: &str) -> StoreResult<Branch>;

    /// Returns `Ok(None)` if the branch does not exist.
    fn branch(&self, id: &BranchId) -> StoreResult<Option<Branch>>;

    /// The latest commit of a branch, or `None` for an empty branch.
    fn head(&self, branch_id: &BranchId) -> StoreResult<Option<Commit>>;

    /// Page through a branch's commits, newest first.
    ///
    /// Fails with [`StoreError::BranchNotFound`](crate::StoreError::BranchNotFound)
    /// if the branch does not exist.
    fn list_commits(&self, branch_id: &BranchId, limit: usize, offset: usize)
        -> StoreResult<CommitPage>;

    /// Resolve a set of commit ids within one branch.
    ///
    /// Ids that are missing or belong to another branch are left out; callers
    /// compare the result length to the request to detect that.
    fn commits_by_ids(
        &self,
        branch_id: &BranchId,
        ids: &BTreeSet<CommitId>,
    ) -> StoreResult<Vec<Commit>>;

    /// Returns `Ok(None)` if the commit does not exist.
    fn commit(&self, id: &CommitId) -> StoreResult<Option<Commit>>;

    /// Returns `Ok(None)` if the revision does not exist.
    fn revision(&self, id: &RevisionId) -> StoreResult<Option<Revision>>;

    /// Content of a revision.
    ///
    /// Fails with [`StoreError::RevisionNotFound`](crate::StoreError::RevisionNotFound)
    /// if the revision does not exist.
    fn revision_content(&self, id: &RevisionId) -> StoreResult<Content> {
        self.revision(id)?
            .map(|r| r.content)
            .ok_or(crate::StoreError::RevisionNotFound(*id))
    }

    /// Store a new immutable revision for a branch.
    fn insert_revision(
        &self,
        branch_id: &BranchId,
        content: Content,
        message: Option<&str>,
        author: &str,
    ) -> StoreResult<Revision>;

    /// Extend a branch's chain. `parent_commit_id` must be the current head.
    fn append_commit(
        &self,
        branch_id: &BranchId,
        revision_id: &RevisionId,
        content_hash: Option<&str>,
        parent_commit_id: Option<&CommitId>,
        message: Option<&str>,
        author: &str,
    ) -> StoreResult<Commit>;

    /// Number of commits on a branch.
    fn commit_count(&self, branch_id: &BranchId) -> StoreResult<u64>;

    /// Returns `Ok(None)` if the rollback intent does not exist.
    fn intent(&self, id: &IntentId) -> StoreResult<Option<RollbackIntent>>;

    /// Rollback intents still awaiting their new revision, oldest first.
    fn pending_intents(&self) -> StoreResult<Vec<RollbackIntent>>;
}
