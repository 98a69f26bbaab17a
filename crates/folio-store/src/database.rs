//! In-memory relational database backing the commit store, audit log and
//! rollback outbox.
//!
//! Tables live behind a single `RwLock`. Reads take the shared lock through
//! [`Database::read`]. Writes go through a [`Transaction`], which holds the
//! exclusive lock for its whole lifetime and stages every insert until
//! [`Transaction::commit`]. Dropping a transaction without committing discards
//! everything it staged.
//!
//! Integrity rules are enforced here, the way foreign keys and unique indexes
//! would be in a SQL schema:
//!
//! - a commit's branch and revision must exist, and the revision must belong
//!   to the same branch
//! - a commit's parent must be the current head of the same branch; only the
//!   first commit of a branch may omit it
//! - audit dedupe keys are unique
//!
//! Nothing here ever updates or deletes a branch, commit, revision or audit
//! event. Rollback intents are the only rows that change state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use folio_crypto::{commit_hash, CommitFields};
use folio_types::{
    AuditEvent, Branch, BranchId, Commit, CommitId, Content, IntentId, Revision, RevisionId,
    RollbackIntent,
};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Shared in-memory database. Wrap in an `Arc` to share between stores.
pub struct Database {
    tables: RwLock<Tables>,
    clock: Clock,
    available: AtomicBool,
    fail_next_commit: AtomicBool,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock: Clock::default(),
            available: AtomicBool::new(true),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Take the shared read lock.
    pub fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.check_available()?;
        self.tables.read().map_err(|_| poisoned())
    }

    /// Open an exclusive write transaction.
    pub fn begin(&self) -> StoreResult<Transaction<'_>> {
        self.check_available()?;
        let tables = self.tables.write().map_err(|_| poisoned())?;
        Ok(Transaction {
            db: self,
            tables,
            staged: Staged::default(),
        })
    }

    /// Simulate the store going offline (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make the next [`Transaction::commit`] fail, discarding its writes.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("database is offline".into()))
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("database lock poisoned".into())
}

/// Issues strictly increasing timestamps so `createdAt` is a total order.
#[derive(Default)]
struct Clock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock {
    fn next(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }
}

/// Committed table contents.
#[derive(Default)]
pub struct Tables {
    branches: HashMap<BranchId, Branch>,
    commits: HashMap<CommitId, Commit>,
    /// Commit ids per branch, in append order.
    chains: HashMap<BranchId, Vec<CommitId>>,
    revisions: HashMap<RevisionId, Revision>,
    /// Highest revision number per branch.
    revision_numbers: HashMap<BranchId, u64>,
    audit_events: Vec<AuditEvent>,
    audit_keys: HashSet<String>,
    intents: BTreeMap<IntentId, RollbackIntent>,
}

impl Tables {
    pub fn branch(&self, id: &BranchId) -> Option<&Branch> {
        self.branches.get(id)
    }

    pub fn commit(&self, id: &CommitId) -> Option<&Commit> {
        self.commits.get(id)
    }

    pub fn revision(&self, id: &RevisionId) -> Option<&Revision> {
        self.revisions.get(id)
    }

    /// The most recently appended commit of a branch.
    pub fn head(&self, branch: &BranchId) -> Option<&Commit> {
        self.chains
            .get(branch)
            .and_then(|chain| chain.last())
            .and_then(|id| self.commits.get(id))
    }

    /// All commits of a branch in append order.
    pub fn branch_commits(&self, branch: &BranchId) -> Vec<&Commit> {
        self.chains
            .get(branch)
            .map(|chain| chain.iter().filter_map(|id| self.commits.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn last_revision_number(&self, branch: &BranchId) -> u64 {
        self.revision_numbers.get(branch).copied().unwrap_or(0)
    }

    pub fn audit_events(&self) -> &[AuditEvent] {
        &self.audit_events
    }

    pub fn audit_key_exists(&self, key: &str) -> bool {
        self.audit_keys.contains(key)
    }

    pub fn intent(&self, id: &IntentId) -> Option<&RollbackIntent> {
        self.intents.get(id)
    }

    /// All rollback intents, oldest first.
    pub fn intents(&self) -> impl Iterator<Item = &RollbackIntent> {
        self.intents.values()
    }
}

#[derive(Default)]
struct Staged {
    branches: Vec<Branch>,
    revisions: Vec<Revision>,
    commits: Vec<Commit>,
    audit_events: Vec<AuditEvent>,
    intents: BTreeMap<IntentId, RollbackIntent>,
}

impl Staged {
    fn is_empty(&self) -> bool {
        self.branches.is_empty()
            && self.revisions.is_empty()
            && self.commits.is_empty()
            && self.audit_events.is_empty()
            && self.intents.is_empty()
    }
}

/// Input for [`Transaction::append_commit`].
#[derive(Clone, Debug)]
pub struct NewCommit {
    pub branch_id: BranchId,
    /// `None` is accepted only for importing legacy rows.
    pub revision_id: Option<RevisionId>,
    pub content_hash: Option<String>,
    pub parent_commit_id: Option<CommitId>,
    pub message: Option<String>,
    pub author: String,
}

/// An exclusive write transaction. Reads see committed rows plus this
/// transaction's own staged rows.
pub struct Transaction<'a> {
    db: &'a Database,
    tables: RwLockWriteGuard<'a, Tables>,
    staged: Staged,
}

impl<'a> Transaction<'a> {
    /// Next timestamp from the database clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.db.clock.next()
    }

    pub fn get_branch(&self, id: &BranchId) -> Option<&Branch> {
        self.staged
            .branches
            .iter()
            .find(|b| b.id == *id)
            .or_else(|| self.tables.branch(id))
    }

    pub fn get_commit(&self, id: &CommitId) -> Option<&Commit> {
        self.staged
            .commits
            .iter()
            .find(|c| c.id == *id)
            .or_else(|| self.tables.commit(id))
    }

    pub fn get_revision(&self, id: &RevisionId) -> Option<&Revision> {
        self.staged
            .revisions
            .iter()
            .find(|r| r.id == *id)
            .or_else(|| self.tables.revision(id))
    }

    pub fn get_intent(&self, id: &IntentId) -> Option<&RollbackIntent> {
        self.staged
            .intents
            .get(id)
            .or_else(|| self.tables.intent(id))
    }

    /// Current head of a branch, including commits staged here.
    pub fn head(&self, branch: &BranchId) -> Option<&Commit> {
        self.staged
            .commits
            .iter()
            .rev()
            .find(|c| c.branch_id == *branch)
            .or_else(|| self.tables.head(branch))
    }

    pub fn audit_key_exists(&self, key: &str) -> bool {
        self.tables.audit_key_exists(key)
            || self.staged.audit_events.iter().any(|e| e.dedupe_key == key)
    }

    /// The open (pending or in progress) intent for a rollback of `branch`
    /// to `target`, if one is outstanding.
    pub fn open_intent(&self, branch: &BranchId, target: &CommitId) -> Option<&RollbackIntent> {
        let matches = |i: &&RollbackIntent| {
            i.is_open() && i.branch_id == *branch && i.target_commit_id == *target
        };
        self.staged
            .intents
            .values()
            .find(matches)
            .or_else(|| {
                self.tables
                    .intents()
                    .filter(|i| !self.staged.intents.contains_key(&i.id))
                    .find(matches)
            })
    }

    pub fn insert_branch(&mut self, manuscript_id: &str) -> Branch {
        let branch = Branch {
            id: BranchId::new(),
            manuscript_id: manuscript_id.to_string(),
            created_at: self.now(),
        };
        self.staged.branches.push(branch.clone());
        branch
    }

    /// Stage a new immutable revision with the next revision number of its
    /// branch.
    pub fn insert_revision(
        &mut self,
        branch_id: &BranchId,
        content: Content,
        message: Option<&str>,
        author: &str,
    ) -> StoreResult<Revision> {
        if self.get_branch(branch_id).is_none() {
            return Err(StoreError::BranchNotFound(*branch_id));
        }
        let staged_max = self
            .staged
            .revisions
            .iter()
            .filter(|r| r.branch_id == *branch_id)
            .map(|r| r.revision_number)
            .max()
            .unwrap_or(0);
        let revision_number = staged_max.max(self.tables.last_revision_number(branch_id)) + 1;

        let revision = Revision {
            id: RevisionId::new(),
            branch_id: *branch_id,
            content,
            revision_number,
            commit_message: message.map(str::to_string),
            created_by: author.to_string(),
            created_at: self.now(),
        };
        self.staged.revisions.push(revision.clone());
        Ok(revision)
    }

    /// Stage a commit at the tip of its branch.
    pub fn append_commit(&mut self, new: NewCommit) -> StoreResult<Commit> {
        if self.get_branch(&new.branch_id).is_none() {
            return Err(StoreError::BranchNotFound(new.branch_id));
        }

        if let Some(revision_id) = &new.revision_id {
            match self.get_revision(revision_id) {
                Some(r) if r.branch_id == new.branch_id => {}
                _ => return Err(StoreError::RevisionNotFound(*revision_id)),
            }
        }

        if let Some(parent) = &new.parent_commit_id {
            match self.get_commit(parent) {
                Some(c) if c.branch_id == new.branch_id => {}
                _ => {
                    return Err(StoreError::ParentNotInBranch {
                        parent: *parent,
                        branch: new.branch_id,
                    })
                }
            }
        }

        let head = self.head(&new.branch_id).map(|c| c.id);
        if head != new.parent_commit_id {
            return Err(StoreError::StaleParent {
                branch: new.branch_id,
                expected: head,
                actual: new.parent_commit_id,
            });
        }

        let created_at = self.now();
        let commit_hash = commit_hash(&CommitFields {
            branch_id: new.branch_id,
            parent_commit_id: new.parent_commit_id,
            revision_id: new.revision_id,
            content_hash: new.content_hash.as_deref(),
            message: new.message.as_deref(),
            author: &new.author,
            created_at,
        });

        let commit = Commit {
            id: CommitId::new(),
            branch_id: new.branch_id,
            parent_commit_id: new.parent_commit_id,
            commit_hash,
            commit_message: new.message,
            revision_id: new.revision_id,
            content_hash: new.content_hash,
            created_by: new.author,
            created_at,
        };
        self.staged.commits.push(commit.clone());
        Ok(commit)
    }

    /// Stage an audit event. Fails if its dedupe key is already taken.
    pub fn insert_audit_event(&mut self, event: AuditEvent) -> StoreResult<()> {
        if self.audit_key_exists(&event.dedupe_key) {
            return Err(StoreError::UniqueViolation {
                table: "audit_events",
                key: event.dedupe_key,
            });
        }
        self.staged.audit_events.push(event);
        Ok(())
    }

    /// Insert or replace a rollback intent.
    pub fn put_intent(&mut self, intent: RollbackIntent) {
        self.staged.intents.insert(intent.id, intent);
    }

    /// Apply every staged write atomically and release the lock.
    pub fn commit(mut self) -> StoreResult<()> {
        if self.db.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("transaction commit failed".into()));
        }
        self.db.check_available()?;

        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return Ok(());
        }
        debug!(
            revisions = staged.revisions.len(),
            commits = staged.commits.len(),
            audit_events = staged.audit_events.len(),
            intents = staged.intents.len(),
            "committing transaction"
        );

        let tables = &mut *self.tables;
        for branch in staged.branches {
            tables.branches.insert(branch.id, branch);
        }
        for revision in staged.revisions {
            let last = tables.revision_numbers.entry(revision.branch_id).or_default();
            *last = (*last).max(revision.revision_number);
            tables.revisions.insert(revision.id, revision);
        }
        for commit in staged.commits {
            tables.chains.entry(commit.branch_id).or_default().push(commit.id);
            tables.commits.insert(commit.id, commit);
        }
        for event in staged.audit_events {
            tables.audit_keys.insert(event.dedupe_key.clone());
            tables.audit_events.push(event);
        }
        for (id, intent) in staged.intents {
            tables.intents.insert(id, intent);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{ActorType, IntentStatus};
    use serde_json::json;

    fn content(value: serde_json::Value) -> Content {
        serde_json::from_value(value).unwrap()
    }

    fn audit_event(key: &str) -> AuditEvent {
        AuditEvent {
            stream_type: "branch".into(),
            stream_key: "b".into(),
            actor_type: ActorType::User,
            actor_id: "alice".into(),
            action: "TEST".into(),
            resource_type: "commit".into(),
            resource_id: "c".into(),
            payload: json!({}),
            dedupe_key: key.into(),
            created_at: Utc::now(),
        }
    }

    fn seeded(db: &Database) -> (Branch, Commit) {
        let mut tx = db.begin().unwrap();
        let branch = tx.insert_branch("ms-1");
        let revision = tx
            .insert_revision(&branch.id, content(json!({"a": 1})), None, "alice")
            .unwrap();
        let commit = tx
            .append_commit(NewCommit {
                branch_id: branch.id,
                revision_id: Some(revision.id),
                content_hash: None,
                parent_commit_id: None,
                message: Some("first".into()),
                author: "alice".into(),
            })
            .unwrap();
        tx.commit().unwrap();
        (branch, commit)
    }

    #[test]
    fn committed_writes_are_visible() {
        let db = Database::new();
        let (branch, commit) = seeded(&db);
        let tables = db.read().unwrap();
        assert_eq!(tables.branch(&branch.id), Some(&branch));
        assert_eq!(tables.head(&branch.id), Some(&commit));
        assert_eq!(tables.last_revision_number(&branch.id), 1);
    }

    #[test]
    fn dropped_transaction_discards_writes() {
        let db = Database::new();
        let (branch, _) = seeded(&db);
        {
            let mut tx = db.begin().unwrap();
            tx.insert_revision(&branch.id, Content::new(), None, "alice")
                .unwrap();
            tx.insert_audit_event(audit_event("k1")).unwrap();
        }
        let tables = db.read().unwrap();
        assert_eq!(tables.last_revision_number(&branch.id), 1);
        assert!(tables.audit_events().is_empty());
    }

    #[test]
    fn staged_rows_are_visible_inside_transaction() {
        let db = Database::new();
        let mut tx = db.begin().unwrap();
        let branch = tx.insert_branch("ms-1");
        let r1 = tx
            .insert_revision(&branch.id, Content::new(), None, "alice")
            .unwrap();
        let r2 = tx
            .insert_revision(&branch.id, Content::new(), None, "alice")
            .unwrap();
        assert_eq!(r1.revision_number, 1);
        assert_eq!(r2.revision_number, 2);
        assert!(tx.get_revision(&r2.id).is_some());
    }

    #[test]
    fn audit_dedupe_key_is_unique_within_and_across_transactions() {
        let db = Database::new();
        let mut tx = db.begin().unwrap();
        tx.insert_audit_event(audit_event("k1")).unwrap();
        assert!(matches!(
            tx.insert_audit_event(audit_event("k1")),
            Err(StoreError::UniqueViolation { .. })
        ));
        tx.commit().unwrap();

        let mut tx = db.begin().unwrap();
        assert!(tx.audit_key_exists("k1"));
        assert!(tx.insert_audit_event(audit_event("k1")).is_err());
        drop(tx);
        assert_eq!(db.read().unwrap().audit_events().len(), 1);
    }

    #[test]
    fn parent_must_be_current_head() {
        let db = Database::new();
        let (branch, first) = seeded(&db);
        let mut tx = db.begin().unwrap();
        let revision = tx
            .insert_revision(&branch.id, Content::new(), None, "alice")
            .unwrap();
        let err = tx
            .append_commit(NewCommit {
                branch_id: branch.id,
                revision_id: Some(revision.id),
                content_hash: None,
                parent_commit_id: None,
                message: None,
                author: "alice".into(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::StaleParent {
                branch: branch.id,
                expected: Some(first.id),
                actual: None,
            }
        );
    }

    #[test]
    fn parent_from_other_branch_is_rejected() {
        let db = Database::new();
        let (_, other_commit) = seeded(&db);
        let (branch, _) = seeded(&db);
        let mut tx = db.begin().unwrap();
        let err = tx
            .append_commit(NewCommit {
                branch_id: branch.id,
                revision_id: None,
                content_hash: None,
                parent_commit_id: Some(other_commit.id),
                message: None,
                author: "alice".into(),
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::ParentNotInBranch { .. }));
    }

    #[test]
    fn revision_from_other_branch_is_rejected() {
        let db = Database::new();
        let (other, _) = seeded(&db);
        let mut tx = db.begin().unwrap();
        let foreign = tx
            .insert_revision(&other.id, Content::new(), None, "alice")
            .unwrap();
        let branch = tx.insert_branch("ms-2");
        let err = tx
            .append_commit(NewCommit {
                branch_id: branch.id,
                revision_id: Some(foreign.id),
                content_hash: None,
                parent_commit_id: None,
                message: None,
                author: "alice".into(),
            })
            .unwrap_err();
        assert_eq!(err, StoreError::RevisionNotFound(foreign.id));
    }

    #[test]
    fn failed_commit_discards_writes() {
        let db = Database::new();
        db.fail_next_commit();
        let mut tx = db.begin().unwrap();
        tx.insert_audit_event(audit_event("k1")).unwrap();
        assert!(matches!(tx.commit(), Err(StoreError::Unavailable(_))));
        assert!(db.read().unwrap().audit_events().is_empty());

        // The failure is one-shot.
        let mut tx = db.begin().unwrap();
        tx.insert_audit_event(audit_event("k1")).unwrap();
        tx.commit().unwrap();
        assert_eq!(db.read().unwrap().audit_events().len(), 1);
    }

    #[test]
    fn offline_database_rejects_everything() {
        let db = Database::new();
        db.set_available(false);
        assert!(matches!(db.read(), Err(StoreError::Unavailable(_))));
        assert!(matches!(db.begin(), Err(StoreError::Unavailable(_))));
        db.set_available(true);
        assert!(db.read().is_ok());
    }

    #[test]
    fn open_intent_lookup_sees_staged_replacements() {
        let db = Database::new();
        let (branch, commit) = seeded(&db);
        let mut tx = db.begin().unwrap();
        let intent = RollbackIntent {
            id: IntentId::new(),
            branch_id: branch.id,
            target_commit_id: commit.id,
            target_revision_id: commit.revision_id.unwrap(),
            content_hash: "h".into(),
            commit_message: "restore".into(),
            actor_id: "alice".into(),
            status: IntentStatus::Pending,
            new_revision_id: None,
            new_revision_number: None,
            new_commit_id: None,
            created_at: tx.now(),
            completed_at: None,
        };
        tx.put_intent(intent.clone());
        tx.commit().unwrap();

        let mut tx = db.begin().unwrap();
        assert_eq!(tx.open_intent(&branch.id, &commit.id), Some(&intent));
        assert!(tx.open_intent(&branch.id, &CommitId::new()).is_none());

        let claimed = RollbackIntent {
            status: IntentStatus::InProgress,
            ..intent.clone()
        };
        tx.put_intent(claimed.clone());
        assert_eq!(tx.open_intent(&branch.id, &commit.id), Some(&claimed));

        let completed = RollbackIntent {
            status: IntentStatus::Completed,
            ..intent.clone()
        };
        tx.put_intent(completed);
        assert!(tx.open_intent(&branch.id, &commit.id).is_none());
    }

    #[test]
    fn clock_is_strictly_increasing() {
        let clock = Clock::default();
        let mut prev = clock.next();
        for _ in 0..1000 {
            let next = clock.next();
            assert!(next > prev);
            prev = next;
        }
    }
}
