use std::sync::Arc;

use folio_crypto::content_hash;
use folio_store::{CommitStore, NewCommit, StoreResult};
use folio_types::{BranchId, Commit, Content, Revision};
use tracing::info;

/// The revision and commit produced by one revision creation.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatedRevision {
    pub revision: Revision,
    pub commit: Commit,
}

/// Materializes new content as the next commit of a branch.
///
/// Rollback hands the restored content to this collaborator after its audit
/// transaction has committed, so the call runs outside that transaction.
pub trait RevisionCreator: Send + Sync {
    fn create_revision(
        &self,
        branch_id: &BranchId,
        content: Content,
        commit_message: &str,
        created_by: &str,
    ) -> StoreResult<CreatedRevision>;
}

/// [`RevisionCreator`] writing straight into a [`CommitStore`].
///
/// The revision and its commit are written in one transaction; the commit's
/// parent is whatever the head is when that transaction runs.
#[derive(Clone)]
pub struct StoreRevisionCreator {
    store: Arc<dyn CommitStore>,
}

impl StoreRevisionCreator {
    pub fn new(store: Arc<dyn CommitStore>) -> Self {
        Self { store }
    }
}

impl RevisionCreator for StoreRevisionCreator {
    fn create_revision(
        &self,
        branch_id: &BranchId,
        content: Content,
        commit_message: &str,
        created_by: &str,
    ) -> StoreResult<CreatedRevision> {
        let hash = content_hash(&content);
        let mut tx = self.store.begin()?;
        let parent = tx.head(branch_id).map(|c| c.id);
        let revision = tx.insert_revision(branch_id, content, Some(commit_message), created_by)?;
        let commit = tx.append_commit(NewCommit {
            branch_id: *branch_id,
            revision_id: Some(revision.id),
            content_hash: Some(hash),
            parent_commit_id: parent,
            message: Some(commit_message.to_string()),
            author: created_by.to_string(),
        })?;
        tx.commit()?;

        info!(
            branch = %branch_id,
            revision = %revision.id,
            number = revision.revision_number,
            commit = %commit.id,
            "revision created"
        );
        Ok(CreatedRevision { revision, commit })
    }
}
