use std::collections::BTreeSet;
use std::sync::Arc;

use folio_audit::{AuditLog, InMemoryAuditLog};
use folio_diff::diff_documents;
use folio_rollback::{RevisionCreator, RollbackCoordinator, StoreRevisionCreator};
use folio_store::{CommitStore, Database, InMemoryCommitStore};
use folio_types::{Branch, BranchId, Commit, CommitId, Content};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};
use crate::response::{DiffResponse, DiffStrategy, ListCommitsResponse, RollbackResponse};

/// Page size rules for commit listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
        }
    }
}

impl Pagination {
    /// Resolve a requested limit, rejecting zero and anything above the max.
    pub fn resolve_limit(&self, limit: Option<usize>) -> SdkResult<usize> {
        match limit {
            None => Ok(self.default_limit),
            Some(0) => Err(SdkError::InvalidRequest("limit must be at least 1".into())),
            Some(n) if n > self.max_limit => Err(SdkError::InvalidRequest(format!(
                "limit {n} exceeds maximum of {}",
                self.max_limit
            ))),
            Some(n) => Ok(n),
        }
    }
}

/// Entry point for embedding Folio.
///
/// Wraps a commit store, an audit log and a rollback coordinator that share
/// one database.
pub struct Folio {
    store: Arc<dyn CommitStore>,
    audit: Arc<dyn AuditLog>,
    creator: Arc<dyn RevisionCreator>,
    rollback: RollbackCoordinator,
    pagination: Pagination,
}

impl Folio {
    /// A self-contained instance over a fresh in-memory database.
    pub fn in_memory() -> Self {
        let db = Arc::new(Database::new());
        let store: Arc<dyn CommitStore> = Arc::new(InMemoryCommitStore::with_database(db.clone()));
        let audit: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::new(db));
        let creator: Arc<dyn RevisionCreator> = Arc::new(StoreRevisionCreator::new(store.clone()));
        Self::new(store, audit, creator)
    }

    /// Assemble from parts. `store` and `audit` must share a database.
    pub fn new(
        store: Arc<dyn CommitStore>,
        audit: Arc<dyn AuditLog>,
        creator: Arc<dyn RevisionCreator>,
    ) -> Self {
        let rollback = RollbackCoordinator::new(store.clone(), audit.clone(), creator.clone());
        Self {
            store,
            audit,
            creator,
            rollback,
            pagination: Pagination::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn store(&self) -> &Arc<dyn CommitStore> {
        &self.store
    }

    pub fn audit(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    pub fn coordinator(&self) -> &RollbackCoordinator {
        &self.rollback
    }

    // ---- Authoring ----

    pub fn create_branch(&self, manuscript_id: &str) -> SdkResult<Branch> {
        Ok(self.store.create_branch(manuscript_id)?)
    }

    /// Save new content as the next commit of a branch.
    pub fn save(
        &self,
        branch_id: &BranchId,
        content: Content,
        message: &str,
        author: &str,
    ) -> SdkResult<Commit> {
        let created = self
            .creator
            .create_revision(branch_id, content, message, author)?;
        Ok(created.commit)
    }

    // ---- History ----

    /// Page through a branch's commits, newest first.
    pub fn list_commits(
        &self,
        branch_id: &BranchId,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> SdkResult<ListCommitsResponse> {
        let limit = self.pagination.resolve_limit(limit)?;
        let offset = offset.unwrap_or(0);
        let page = self.store.list_commits(branch_id, limit, offset)?;
        Ok(ListCommitsResponse {
            branch_id: *branch_id,
            commits: page.commits,
            total: page.total,
            limit,
            offset,
        })
    }

    /// Compare the content of two commits of one branch.
    pub fn diff(
        &self,
        branch_id: &BranchId,
        from_commit_id: &CommitId,
        to_commit_id: &CommitId,
        strategy: DiffStrategy,
    ) -> SdkResult<DiffResponse> {
        if strategy == DiffStrategy::Stored {
            return Err(SdkError::NotImplemented(
                "stored diffs are not available; use strategy=computed".into(),
            ));
        }

        if self.store.branch(branch_id)?.is_none() {
            return Err(SdkError::NotFound(format!("branch not found: {branch_id}")));
        }

        let not_in_branch = || {
            SdkError::NotFound(format!(
                "commits {from_commit_id} and {to_commit_id} are not both in branch {branch_id}"
            ))
        };
        let wanted: BTreeSet<CommitId> = [*from_commit_id, *to_commit_id].into_iter().collect();
        let commits = self.store.commits_by_ids(branch_id, &wanted)?;
        if commits.len() != wanted.len() {
            return Err(not_in_branch());
        }
        let find = |id: &CommitId| commits.iter().find(|c| c.id == *id);
        let from = find(from_commit_id).ok_or_else(not_in_branch)?;
        let to = find(to_commit_id).ok_or_else(not_in_branch)?;

        let from_content = self.commit_content(from)?;
        let to_content = self.commit_content(to)?;

        let diff = diff_documents(&from_content, &to_content);
        debug!(
            branch = %branch_id,
            from = %from_commit_id,
            to = %to_commit_id,
            added = diff.added_line_count,
            removed = diff.removed_line_count,
            "computed diff"
        );
        Ok(DiffResponse {
            from_commit_id: *from_commit_id,
            to_commit_id: *to_commit_id,
            strategy,
            unified_diff: diff.unified_diff,
            section_summary: diff.section_summary,
            added_line_count: diff.added_line_count,
            removed_line_count: diff.removed_line_count,
        })
    }

    fn commit_content(&self, commit: &Commit) -> SdkResult<Content> {
        let revision_id = commit.revision_id.ok_or_else(|| {
            SdkError::InvalidState(format!("commit {} has no linked revision", commit.id))
        })?;
        self.store
            .revision(&revision_id)?
            .map(|r| r.content)
            .ok_or_else(|| {
                SdkError::NotFound(format!(
                    "revision {revision_id} of commit {} not found",
                    commit.id
                ))
            })
    }

    // ---- Rollback ----

    /// Restore the content of `target_commit_id` as a new commit.
    pub fn rollback(
        &self,
        branch_id: &BranchId,
        target_commit_id: &CommitId,
        message: Option<&str>,
        actor_id: &str,
    ) -> SdkResult<RollbackResponse> {
        let outcome = self
            .rollback
            .rollback(branch_id, target_commit_id, message, actor_id)?;
        info!(
            branch = %branch_id,
            target = %target_commit_id,
            commit = %outcome.new_commit_id,
            "rollback succeeded"
        );
        Ok(RollbackResponse {
            success: true,
            new_revision_id: outcome.new_revision_id,
            new_revision_number: outcome.new_revision_number,
            new_commit_id: outcome.new_commit_id,
            rolled_back_to_commit_id: outcome.rolled_back_to_commit_id,
            intent_id: outcome.intent_id,
        })
    }

    /// Finish rollbacks whose revision creation failed earlier. Returns the
    /// number completed and the number still failing.
    pub fn resume_pending_rollbacks(&self) -> SdkResult<(usize, usize)> {
        let report = self.rollback.resume_pending()?;
        let completed = report.iter().filter(|r| r.result.is_ok()).count();
        Ok((completed, report.len() - completed))
    }
}
