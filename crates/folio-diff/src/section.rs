//! Per-section change summary.

use std::collections::BTreeSet;

use folio_crypto::canonical_value;
use folio_types::Content;
use serde::{Deserialize, Serialize};

/// How one top-level section changed between two documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionAction {
    Added,
    Deleted,
    Modified,
    Unchanged,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionChange {
    pub section_key: String,
    pub action: SectionAction,
}

/// Classify every key of `from ∪ to`, sorted by key.
///
/// A key in both documents is `Modified` iff the canonical serializations of
/// its two values differ.
pub fn summarize_sections(from: &Content, to: &Content) -> Vec<SectionChange> {
    let keys: BTreeSet<&String> = from.keys().chain(to.keys()).collect();
    keys.into_iter()
        .map(|key| {
            let action = match (from.get(key), to.get(key)) {
                (Some(a), Some(b)) if canonical_value(a) == canonical_value(b) => {
                    SectionAction::Unchanged
                }
                (Some(_), Some(_)) => SectionAction::Modified,
                (Some(_), None) => SectionAction::Deleted,
                (None, _) => SectionAction::Added,
            };
            SectionChange {
                section_key: key.clone(),
                action,
            }
        })
        .collect()
}
