use std::fmt;

use folio_audit::AuditError;
use folio_rollback::RollbackError;
use folio_store::StoreError;
use folio_types::{IntentId, TypeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error class surfaced to callers, independent of transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    InvalidRequest,
    InvalidState,
    NotImplemented,
    StorageUnavailable,
    DuplicateEvent,
    DownstreamFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::NotImplemented => "NotImplemented",
            ErrorKind::StorageUnavailable => "StorageUnavailable",
            ErrorKind::DuplicateEvent => "DuplicateEvent",
            ErrorKind::DownstreamFailure => "DownstreamFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// Branch, commit, revision or intent missing, or a commit outside the
    /// requested branch.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The record exists but cannot be used as asked, e.g. a commit without
    /// a linked revision.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("duplicate event: {0}")]
    DuplicateEvent(String),

    /// Revision creation failed after the rollback was audited. The intent
    /// can be completed later.
    #[error("downstream failure for rollback intent {intent_id}: {message}")]
    DownstreamFailure { intent_id: IntentId, message: String },
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::NotFound(_) => ErrorKind::NotFound,
            SdkError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            SdkError::InvalidState(_) => ErrorKind::InvalidState,
            SdkError::NotImplemented(_) => ErrorKind::NotImplemented,
            SdkError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            SdkError::DuplicateEvent(_) => ErrorKind::DuplicateEvent,
            SdkError::DownstreamFailure { .. } => ErrorKind::DownstreamFailure,
        }
    }
}

impl From<StoreError> for SdkError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::BranchNotFound(_)
            | StoreError::CommitNotFound(_)
            | StoreError::RevisionNotFound(_)
            | StoreError::IntentNotFound(_)
            | StoreError::ParentNotInBranch { .. } => SdkError::NotFound(message),
            StoreError::StaleParent { .. } | StoreError::UniqueViolation { .. } => {
                SdkError::InvalidState(message)
            }
            StoreError::Unavailable(_) => SdkError::StorageUnavailable(message),
        }
    }
}

impl From<AuditError> for SdkError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::DuplicateEvent { dedupe_key } => SdkError::DuplicateEvent(dedupe_key),
            AuditError::Store(e) => e.into(),
        }
    }
}

impl From<RollbackError> for SdkError {
    fn from(err: RollbackError) -> Self {
        let message = err.to_string();
        match err {
            RollbackError::BranchNotFound(_)
            | RollbackError::CommitNotFound { .. }
            | RollbackError::RevisionNotFound(_)
            | RollbackError::IntentNotFound(_) => SdkError::NotFound(message),
            RollbackError::MissingRevision(_) | RollbackError::IntentInProgress(_) => {
                SdkError::InvalidState(message)
            }
            RollbackError::DownstreamFailure { intent_id, reason } => SdkError::DownstreamFailure {
                intent_id,
                message: reason,
            },
            RollbackError::Store(e) => e.into(),
            RollbackError::Audit(e) => e.into(),
        }
    }
}

impl From<TypeError> for SdkError {
    fn from(err: TypeError) -> Self {
        SdkError::InvalidRequest(err.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{BranchId, CommitId, RevisionId};

    #[test]
    fn store_errors_map_to_kinds() {
        let cases = [
            (StoreError::BranchNotFound(BranchId::new()), ErrorKind::NotFound),
            (StoreError::CommitNotFound(CommitId::new()), ErrorKind::NotFound),
            (
                StoreError::StaleParent {
                    branch: BranchId::new(),
                    expected: None,
                    actual: Some(CommitId::new()),
                },
                ErrorKind::InvalidState,
            ),
            (StoreError::Unavailable("down".into()), ErrorKind::StorageUnavailable),
        ];
        for (err, kind) in cases {
            assert_eq!(SdkError::from(err).kind(), kind);
        }
    }

    #[test]
    fn rollback_errors_map_to_kinds() {
        let intent_id = IntentId::new();
        let err: SdkError = RollbackError::DownstreamFailure {
            intent_id,
            reason: "boom".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::DownstreamFailure);
        assert!(err.to_string().contains(&intent_id.to_string()));

        let err: SdkError = RollbackError::MissingRevision(CommitId::new()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err: SdkError = RollbackError::RevisionNotFound(RevisionId::new()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: SdkError = RollbackError::IntentInProgress(intent_id).into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err: SdkError =
            RollbackError::Store(StoreError::Unavailable("offline".into())).into();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }

    #[test]
    fn malformed_id_is_invalid_request() {
        let err: SdkError = "not-a-uuid".parse::<BranchId>().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn kind_serializes_by_name() {
        assert_eq!(
            serde_json::to_value(ErrorKind::NotImplemented).unwrap(),
            serde_json::json!("NotImplemented")
        );
        assert_eq!(ErrorKind::DuplicateEvent.to_string(), "DuplicateEvent");
    }
}
