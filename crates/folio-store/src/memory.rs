use std::collections::BTreeSet;
use std::sync::Arc;

use folio_types::{
    Branch, BranchId, Commit, CommitId, Content, IntentId, Revision, RevisionId, RollbackIntent,
};
use tracing::{debug, info};

use crate::database::{Database, NewCommit, Transaction};
use crate::error::{StoreError, StoreResult};
use crate::traits::{CommitPage, CommitStore};

/// [`CommitStore`] over the in-memory [`Database`].
///
/// Cloning is cheap; clones share the same database.
#[derive(Clone, Debug)]
pub struct InMemoryCommitStore {
    db: Arc<Database>,
}

impl InMemoryCommitStore {
    /// Create a store over a fresh, empty database.
    pub fn new() -> Self {
        Self::with_database(Arc::new(Database::new()))
    }

    /// Create a store over an existing (possibly shared) database.
    pub fn with_database(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The backing database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

impl Default for InMemoryCommitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitStore for InMemoryCommitStore {
    fn begin(&self) -> StoreResult<Transaction<'_>> {
        self.db.begin()
    }

    fn create_branch(&self, manuscript_id: &str) -> StoreResult<Branch> {
        let mut tx = self.db.begin()?;
        let branch = tx.insert_branch(manuscript_id);
        tx.commit()?;
        info!(branch = %branch.id, manuscript = manuscript_id, "branch created");
        Ok(branch)
    }

    fn branch(&self, id: &BranchId) -> StoreResult<Option<Branch>> {
        Ok(self.db.read()?.branch(id).cloned())
    }

    fn head(&self, branch_id: &BranchId) -> StoreResult<Option<Commit>> {
        Ok(self.db.read()?.head(branch_id).cloned())
    }

    fn list_commits(
        &self,
        branch_id: &BranchId,
        limit: usize,
        offset: usize,
    ) -> StoreResult<CommitPage> {
        let tables = self.db.read()?;
        if tables.branch(branch_id).is_none() {
            return Err(StoreError::BranchNotFound(*branch_id));
        }

        let mut commits = tables.branch_commits(branch_id);
        commits.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let total = commits.len() as u64;
        let commits: Vec<Commit> = commits
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        debug!(branch = %branch_id, limit, offset, total, returned = commits.len(), "listed commits");
        Ok(CommitPage { commits, total })
    }

    fn commits_by_ids(
        &self,
        branch_id: &BranchId,
        ids: &BTreeSet<CommitId>,
    ) -> StoreResult<Vec<Commit>> {
        let tables = self.db.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.commit(id))
            .filter(|c| c.branch_id == *branch_id)
            .cloned()
            .collect())
    }

    fn commit(&self, id: &CommitId) -> StoreResult<Option<Commit>> {
        Ok(self.db.read()?.commit(id).cloned())
    }

    fn revision(&self, id: &RevisionId) -> StoreResult<Option<Revision>> {
        Ok(self.db.read()?.revision(id).cloned())
    }

    fn insert_revision(
        &self,
        branch_id: &BranchId,
        content: Content,
        message: Option<&str>,
        author: &str,
    ) -> StoreResult<Revision> {
        let mut tx = self.db.begin()?;
        let revision = tx.insert_revision(branch_id, content, message, author)?;
        tx.commit()?;
        debug!(branch = %branch_id, revision = %revision.id, number = revision.revision_number, "revision stored");
        Ok(revision)
    }

    fn append_commit(
        &self,
        branch_id: &BranchId,
        revision_id: &RevisionId,
        content_hash: Option<&str>,
        parent_commit_id: Option<&CommitId>,
        message: Option<&str>,
        author: &str,
    ) -> StoreResult<Commit> {
        let mut tx = self.db.begin()?;
        let commit = tx.append_commit(NewCommit {
            branch_id: *branch_id,
            revision_id: Some(*revision_id),
            content_hash: content_hash.map(str::to_string),
            parent_commit_id: parent_commit_id.copied(),
            message: message.map(str::to_string),
            author: author.to_string(),
        })?;
        tx.commit()?;
        info!(branch = %branch_id, commit = %commit.id, parent = ?commit.parent_commit_id, "commit appended");
        Ok(commit)
    }

    fn commit_count(&self, branch_id: &BranchId) -> StoreResult<u64> {
        Ok(self.db.read()?.branch_commits(branch_id).len() as u64)
    }

    fn intent(&self, id: &IntentId) -> StoreResult<Option<RollbackIntent>> {
        Ok(self.db.read()?.intent(id).cloned())
    }

    fn pending_intents(&self) -> StoreResult<Vec<RollbackIntent>> {
        let tables = self.db.read()?;
        let mut pending: Vec<RollbackIntent> =
            tables.intents().filter(|i| i.is_pending()).cloned().collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: serde_json::Value) -> Content {
        serde_json::from_value(value).unwrap()
    }

    /// Append a revision + commit at the current head.
    fn edit(store: &InMemoryCommitStore, branch: &BranchId, value: serde_json::Value) -> Commit {
        let doc = content(value);
        let hash = folio_crypto::content_hash(&doc);
        let revision = store.insert_revision(branch, doc, None, "alice").unwrap();
        let head = store.head(branch).unwrap().map(|c| c.id);
        store
            .append_commit(branch, &revision.id, Some(&hash), head.as_ref(), None, "alice")
            .unwrap()
    }

    #[test]
    fn list_returns_newest_first_with_total() {
        let store = InMemoryCommitStore::new();
        let branch = store.create_branch("ms-1").unwrap();
        let c1 = edit(&store, &branch.id, json!({"a": 1}));
        let c2 = edit(&store, &branch.id, json!({"a": 2}));
        let c3 = edit(&store, &branch.id, json!({"a": 3}));

        let page = store.list_commits(&branch.id, 50, 0).unwrap();
        assert_eq!(page.total, 3);
        let ids: Vec<CommitId> = page.commits.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c3.id, c2.id, c1.id]);
    }

    #[test]
    fn list_pages_by_offset() {
        let store = InMemoryCommitStore::new();
        let branch = store.create_branch("ms-1").unwrap();
        let c1 = edit(&store, &branch.id, json!({"a": 1}));
        let c2 = edit(&store, &branch.id, json!({"a": 2}));
        edit(&store, &branch.id, json!({"a": 3}));

        let page = store.list_commits(&branch.id, 2, 1).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.commits.len(), 2);
        assert_eq!(page.commits[0].id, c2.id);
        assert_eq!(page.commits[1].id, c1.id);

        let past_end = store.list_commits(&branch.id, 10, 5).unwrap();
        assert!(past_end.commits.is_empty());
        assert_eq!(past_end.total, 3);
    }

    #[test]
    fn list_unknown_branch_is_not_found() {
        let store = InMemoryCommitStore::new();
        let missing = BranchId::new();
        assert_eq!(
            store.list_commits(&missing, 50, 0).unwrap_err(),
            StoreError::BranchNotFound(missing)
        );
    }

    #[test]
    fn empty_branch_lists_nothing() {
        let store = InMemoryCommitStore::new();
        let branch = store.create_branch("ms-1").unwrap();
        let page = store.list_commits(&branch.id, 50, 0).unwrap();
        assert_eq!(page.total, 0);
        assert!(page.commits.is_empty());
        assert!(store.head(&branch.id).unwrap().is_none());
    }

    #[test]
    fn commits_by_ids_filters_foreign_and_missing() {
        let store = InMemoryCommitStore::new();
        let a = store.create_branch("ms-a").unwrap();
        let b = store.create_branch("ms-b").unwrap();
        let a1 = edit(&store, &a.id, json!({"x": 1}));
        let b1 = edit(&store, &b.id, json!({"y": 1}));

        let ids: BTreeSet<CommitId> = [a1.id, b1.id, CommitId::new()].into_iter().collect();
        let found = store.commits_by_ids(&a.id, &ids).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a1.id);
    }

    #[test]
    fn chain_links_to_previous_head() {
        let store = InMemoryCommitStore::new();
        let branch = store.create_branch("ms-1").unwrap();
        let c1 = edit(&store, &branch.id, json!({"a": 1}));
        let c2 = edit(&store, &branch.id, json!({"a": 2}));
        assert!(c1.is_root());
        assert_eq!(c2.parent_commit_id, Some(c1.id));
        assert_ne!(c1.commit_hash, c2.commit_hash);
        assert_eq!(store.commit_count(&branch.id).unwrap(), 2);
    }

    #[test]
    fn revision_content_roundtrip_and_missing() {
        let store = InMemoryCommitStore::new();
        let branch = store.create_branch("ms-1").unwrap();
        let c1 = edit(&store, &branch.id, json!({"intro": {"text": "Once"}}));
        let revision_id = c1.revision_id.unwrap();
        assert_eq!(
            store.revision_content(&revision_id).unwrap(),
            content(json!({"intro": {"text": "Once"}}))
        );

        let missing = RevisionId::new();
        assert_eq!(
            store.revision_content(&missing).unwrap_err(),
            StoreError::RevisionNotFound(missing)
        );
    }

    #[test]
    fn revision_numbers_increase_per_branch() {
        let store = InMemoryCommitStore::new();
        let a = store.create_branch("ms-a").unwrap();
        let b = store.create_branch("ms-b").unwrap();
        let r1 = store.insert_revision(&a.id, Content::new(), None, "alice").unwrap();
        let r2 = store.insert_revision(&a.id, Content::new(), None, "alice").unwrap();
        let other = store.insert_revision(&b.id, Content::new(), None, "bob").unwrap();
        assert_eq!((r1.revision_number, r2.revision_number), (1, 2));
        assert_eq!(other.revision_number, 1);
    }

    #[test]
    fn stale_parent_is_rejected() {
        let store = InMemoryCommitStore::new();
        let branch = store.create_branch("ms-1").unwrap();
        let c1 = edit(&store, &branch.id, json!({"a": 1}));
        edit(&store, &branch.id, json!({"a": 2}));

        let revision = store
            .insert_revision(&branch.id, Content::new(), None, "alice")
            .unwrap();
        let err = store
            .append_commit(&branch.id, &revision.id, None, Some(&c1.id), None, "alice")
            .unwrap_err();
        assert!(matches!(err, StoreError::StaleParent { .. }));
    }

    #[test]
    fn offline_store_reports_unavailable() {
        let store = InMemoryCommitStore::new();
        let branch = store.create_branch("ms-1").unwrap();
        store.database().set_available(false);
        assert!(matches!(
            store.list_commits(&branch.id, 50, 0),
            Err(StoreError::Unavailable(_))
        ));
    }
}
