//! Rollback orchestration.
//!
//! A rollback runs in two phases:
//!
//! 1. One store transaction re-reads the target revision, appends the
//!    `ROLLBACK_REQUESTED` audit event and records a [`RollbackIntent`]
//!    claimed by the caller. Either all three land or none do.
//! 2. After that transaction commits, the [`RevisionCreator`] writes the
//!    restored content as a new commit and the intent is marked completed.
//!
//! If phase 2 fails the intent goes back to pending.
//! [`RollbackCoordinator::complete_intent`] and
//! [`RollbackCoordinator::resume_pending`] finish it later, and a retried
//! rollback of the same target picks the pending intent back up instead of
//! recording a second one. Only the caller holding the claim creates a
//! revision, so concurrent retries never restore the same intent twice.

use std::collections::BTreeSet;
use std::sync::Arc;

use folio_audit::{rollback_requested, AuditError, AuditLog};
use folio_crypto::content_hash;
use folio_store::CommitStore;
use folio_types::{
    BranchId, Commit, CommitId, IntentId, IntentStatus, RevisionId, RollbackIntent,
};
use tracing::{debug, error, info, warn};

use crate::creator::{CreatedRevision, RevisionCreator};
use crate::error::{RollbackError, RollbackResult};

/// Identifiers produced by a completed rollback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollbackOutcome {
    pub intent_id: IntentId,
    pub new_revision_id: RevisionId,
    pub new_revision_number: u64,
    pub new_commit_id: CommitId,
    pub rolled_back_to_commit_id: CommitId,
}

impl RollbackOutcome {
    /// The recorded result of a completed intent.
    fn from_intent(intent: &RollbackIntent) -> Option<Self> {
        Some(Self {
            intent_id: intent.id,
            new_revision_id: intent.new_revision_id?,
            new_revision_number: intent.new_revision_number?,
            new_commit_id: intent.new_commit_id?,
            rolled_back_to_commit_id: intent.target_commit_id,
        })
    }
}

/// Result of resuming one pending intent.
#[derive(Clone, Debug)]
pub struct ResumeOutcome {
    pub intent_id: IntentId,
    pub result: RollbackResult<RollbackOutcome>,
}

/// Default commit message for a rollback to `target`.
pub fn default_rollback_message(target: &CommitId) -> String {
    format!("Rollback to commit {target}")
}

/// Restores earlier content as a new commit, never rewriting history.
///
/// The store and the audit log must share one database, so the audit event
/// can join the store's transaction.
pub struct RollbackCoordinator {
    store: Arc<dyn CommitStore>,
    audit: Arc<dyn AuditLog>,
    creator: Arc<dyn RevisionCreator>,
}

impl RollbackCoordinator {
    pub fn new(
        store: Arc<dyn CommitStore>,
        audit: Arc<dyn AuditLog>,
        creator: Arc<dyn RevisionCreator>,
    ) -> Self {
        Self {
            store,
            audit,
            creator,
        }
    }

    /// Roll `branch_id` back to the content of `target_commit_id`.
    pub fn rollback(
        &self,
        branch_id: &BranchId,
        target_commit_id: &CommitId,
        message: Option<&str>,
        actor_id: &str,
    ) -> RollbackResult<RollbackOutcome> {
        if self.store.branch(branch_id)?.is_none() {
            return Err(RollbackError::BranchNotFound(*branch_id));
        }

        let wanted = BTreeSet::from([*target_commit_id]);
        let target = self
            .store
            .commits_by_ids(branch_id, &wanted)?
            .into_iter()
            .next()
            .ok_or(RollbackError::CommitNotFound {
                branch: *branch_id,
                commit: *target_commit_id,
            })?;
        let revision_id = target
            .revision_id
            .ok_or(RollbackError::MissingRevision(target.id))?;

        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| default_rollback_message(&target.id));
        let intent = self.record_intent(&target, revision_id, message, actor_id)?;
        self.finish(intent)
    }

    /// Phase 1: audit the request and claim an intent in one transaction.
    ///
    /// A pending intent for the same target is reused and takes this
    /// caller's message and actor. An intent another caller is working on
    /// is reported as in progress.
    fn record_intent(
        &self,
        target: &Commit,
        revision_id: RevisionId,
        message: String,
        actor_id: &str,
    ) -> RollbackResult<RollbackIntent> {
        let branch_id = target.branch_id;
        let mut tx = self.store.begin()?;

        let hash = tx
            .get_revision(&revision_id)
            .filter(|r| r.branch_id == branch_id)
            .map(|r| content_hash(&r.content))
            .ok_or(RollbackError::RevisionNotFound(revision_id))?;

        let event = rollback_requested(&branch_id, &target.id, &hash, actor_id, tx.now());
        match self.audit.append_event(&mut tx, event) {
            Ok(()) => {}
            Err(AuditError::DuplicateEvent { dedupe_key }) => {
                debug!(%dedupe_key, "rollback already audited");
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(open) = tx.open_intent(&branch_id, &target.id).cloned() {
            if open.status == IntentStatus::InProgress {
                warn!(intent = %open.id, branch = %branch_id, "rollback already in progress");
                return Err(RollbackError::IntentInProgress(open.id));
            }
            let claimed = RollbackIntent {
                commit_message: message,
                actor_id: actor_id.to_string(),
                status: IntentStatus::InProgress,
                ..open
            };
            tx.put_intent(claimed.clone());
            tx.commit()?;
            info!(
                intent = %claimed.id,
                branch = %branch_id,
                actor = actor_id,
                "resuming pending rollback"
            );
            return Ok(claimed);
        }

        let intent = RollbackIntent {
            id: IntentId::new(),
            branch_id,
            target_commit_id: target.id,
            target_revision_id: revision_id,
            content_hash: hash,
            commit_message: message,
            actor_id: actor_id.to_string(),
            status: IntentStatus::InProgress,
            new_revision_id: None,
            new_revision_number: None,
            new_commit_id: None,
            created_at: tx.now(),
            completed_at: None,
        };
        tx.put_intent(intent.clone());
        tx.commit()?;

        info!(
            intent = %intent.id,
            branch = %branch_id,
            target = %target.id,
            actor = actor_id,
            "rollback requested"
        );
        Ok(intent)
    }

    /// Claim a pending intent for this caller.
    fn claim(&self, intent_id: &IntentId) -> RollbackResult<Claim> {
        let mut tx = self.store.begin()?;
        let intent = tx
            .get_intent(intent_id)
            .cloned()
            .ok_or(RollbackError::IntentNotFound(*intent_id))?;

        match intent.status {
            IntentStatus::Completed => RollbackOutcome::from_intent(&intent)
                .map(Claim::Completed)
                .ok_or(RollbackError::IntentNotFound(intent.id)),
            IntentStatus::InProgress => {
                warn!(intent = %intent.id, "rollback already in progress");
                Err(RollbackError::IntentInProgress(intent.id))
            }
            IntentStatus::Pending => {
                let claimed = RollbackIntent {
                    status: IntentStatus::InProgress,
                    ..intent
                };
                tx.put_intent(claimed.clone());
                tx.commit()?;
                debug!(intent = %claimed.id, "claimed rollback intent");
                Ok(Claim::Claimed(claimed))
            }
        }
    }

    /// Phase 2: create the new revision for a claimed intent and mark it
    /// completed. A failed creation hands the intent back as pending.
    fn finish(&self, intent: RollbackIntent) -> RollbackResult<RollbackOutcome> {
        let created = match self.create_revision(&intent) {
            Ok(created) => created,
            Err(e) => {
                self.release(&intent);
                return Err(e);
            }
        };

        let intent_id = intent.id;
        let completed = self
            .store
            .begin()
            .and_then(|mut tx| {
                let completed = RollbackIntent {
                    status: IntentStatus::Completed,
                    new_revision_id: Some(created.revision.id),
                    new_revision_number: Some(created.revision.revision_number),
                    new_commit_id: Some(created.commit.id),
                    completed_at: Some(tx.now()),
                    ..intent
                };
                tx.put_intent(completed.clone());
                tx.commit()?;
                Ok(completed)
            })
            .map_err(|e| {
                error!(
                    intent = %intent_id,
                    commit = %created.commit.id,
                    error = %e,
                    "revision created but intent left in progress"
                );
                e
            })?;

        info!(
            intent = %completed.id,
            branch = %completed.branch_id,
            commit = %created.commit.id,
            revision_number = created.revision.revision_number,
            "rollback completed"
        );
        RollbackOutcome::from_intent(&completed).ok_or(RollbackError::IntentNotFound(completed.id))
    }

    fn create_revision(&self, intent: &RollbackIntent) -> RollbackResult<CreatedRevision> {
        let content = self.store.revision_content(&intent.target_revision_id)?;
        self.creator
            .create_revision(
                &intent.branch_id,
                content,
                &intent.commit_message,
                &intent.actor_id,
            )
            .map_err(|e| {
                error!(intent = %intent.id, branch = %intent.branch_id, error = %e, "revision creation failed");
                RollbackError::DownstreamFailure {
                    intent_id: intent.id,
                    reason: e.to_string(),
                }
            })
    }

    /// Hand a claimed intent back to the pending queue.
    fn release(&self, intent: &RollbackIntent) {
        let released = self.store.begin().and_then(|mut tx| {
            let claimed = tx
                .get_intent(&intent.id)
                .is_some_and(|i| i.status == IntentStatus::InProgress);
            if claimed {
                tx.put_intent(RollbackIntent {
                    status: IntentStatus::Pending,
                    ..intent.clone()
                });
            }
            tx.commit()
        });
        if let Err(e) = released {
            error!(intent = %intent.id, error = %e, "rollback intent not released");
        }
    }

    /// Complete one intent. A completed intent returns its recorded result
    /// without creating anything; one held by another caller is reported as
    /// in progress.
    pub fn complete_intent(&self, intent_id: &IntentId) -> RollbackResult<RollbackOutcome> {
        match self.claim(intent_id)? {
            Claim::Completed(outcome) => Ok(outcome),
            Claim::Claimed(intent) => self.finish(intent),
        }
    }

    /// Complete every pending intent, oldest first.
    pub fn resume_pending(&self) -> RollbackResult<Vec<ResumeOutcome>> {
        let pending = self.store.pending_intents()?;
        if !pending.is_empty() {
            info!(count = pending.len(), "resuming pending rollbacks");
        }
        Ok(pending
            .into_iter()
            .map(|intent| ResumeOutcome {
                intent_id: intent.id,
                result: self.complete_intent(&intent.id),
            })
            .collect())
    }

    /// Intents waiting to be completed, oldest first. Intents another caller
    /// is working on are not listed.
    pub fn pending_intents(&self) -> RollbackResult<Vec<RollbackIntent>> {
        Ok(self.store.pending_intents()?)
    }
}

enum Claim {
    Completed(RollbackOutcome),
    Claimed(RollbackIntent),
}
