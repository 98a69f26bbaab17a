//! Audit event construction.

use chrono::{DateTime, Utc};
use folio_types::{ActorType, AuditEvent, BranchId, CommitId};
use serde_json::{json, Value};

/// Action recorded when a rollback has been validated and is about to run.
pub const ROLLBACK_REQUESTED: &str = "ROLLBACK_REQUESTED";

/// Stream type for events scoped to one branch.
pub const BRANCH_STREAM: &str = "branch";

/// Dedupe key for a rollback of `branch_id` to `target_commit_id`.
///
/// Retried requests for the same pair map onto the same key, so at most one
/// `ROLLBACK_REQUESTED` event exists per pair.
pub fn rollback_dedupe_key(branch_id: &BranchId, target_commit_id: &CommitId) -> String {
    format!("rollback:{branch_id}:{target_commit_id}")
}

/// Builder for [`AuditEvent`].
#[derive(Clone, Debug)]
pub struct AuditEventBuilder {
    action: String,
    stream_type: String,
    stream_key: String,
    actor_type: ActorType,
    actor_id: String,
    resource_type: String,
    resource_id: String,
    payload: Value,
    dedupe_key: Option<String>,
}

impl AuditEventBuilder {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            stream_type: String::new(),
            stream_key: String::new(),
            actor_type: ActorType::System,
            actor_id: String::new(),
            resource_type: String::new(),
            resource_id: String::new(),
            payload: Value::Null,
            dedupe_key: None,
        }
    }

    pub fn stream(mut self, stream_type: impl Into<String>, stream_key: impl Into<String>) -> Self {
        self.stream_type = stream_type.into();
        self.stream_key = stream_key.into();
        self
    }

    pub fn actor(mut self, actor_type: ActorType, actor_id: impl Into<String>) -> Self {
        self.actor_type = actor_type;
        self.actor_id = actor_id.into();
        self
    }

    pub fn resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = resource_type.into();
        self.resource_id = resource_id.into();
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    /// Finish the event. Without an explicit dedupe key, one is derived from
    /// the action, stream and resource.
    pub fn build(self, created_at: DateTime<Utc>) -> AuditEvent {
        let dedupe_key = self.dedupe_key.unwrap_or_else(|| {
            format!(
                "{}:{}:{}:{}",
                self.action, self.stream_key, self.resource_type, self.resource_id
            )
        });
        AuditEvent {
            stream_type: self.stream_type,
            stream_key: self.stream_key,
            actor_type: self.actor_type,
            actor_id: self.actor_id,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            payload: self.payload,
            dedupe_key,
            created_at,
        }
    }
}

/// The `ROLLBACK_REQUESTED` event for a validated rollback.
pub fn rollback_requested(
    branch_id: &BranchId,
    target_commit_id: &CommitId,
    content_hash: &str,
    actor_id: &str,
    created_at: DateTime<Utc>,
) -> AuditEvent {
    AuditEventBuilder::new(ROLLBACK_REQUESTED)
        .stream(BRANCH_STREAM, branch_id.to_string())
        .actor(ActorType::User, actor_id)
        .resource("commit", target_commit_id.to_string())
        .payload(json!({
            "branchId": branch_id,
            "targetCommitId": target_commit_id,
            "contentHash": content_hash,
        }))
        .dedupe_key(rollback_dedupe_key(branch_id, target_commit_id))
        .build(created_at)
}
