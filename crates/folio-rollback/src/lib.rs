//! Rollback for Folio branches.
//!
//! Rolling back never rewrites history: the target commit's content is
//! written again as a brand-new commit at the tip of the branch. The request
//! is audited and recorded as a durable intent before the new revision is
//! created, so a failure after auditing can always be finished later.
//!
//! # Key Types
//!
//! - [`RollbackCoordinator`] -- validates, audits and completes rollbacks
//! - [`RevisionCreator`] -- collaborator that writes the restored content
//! - [`StoreRevisionCreator`] -- in-process creator over a `CommitStore`

pub mod coordinator;
pub mod creator;
pub mod error;

pub use coordinator::{default_rollback_message, ResumeOutcome, RollbackCoordinator, RollbackOutcome};
pub use creator::{CreatedRevision, RevisionCreator, StoreRevisionCreator};
pub use error::{RollbackError, RollbackResult};
